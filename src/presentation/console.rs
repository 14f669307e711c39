//! Plain-text rendering of catalog data and notifications.

use std::fmt::Write;

use crate::application::NotificationBuffer;
use crate::domain::entities::{Album, Artist, Page};
use crate::domain::{ConnectionState, Notification, NotificationKind, UserProfile};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[must_use]
pub fn user(profile: &UserProfile) -> String {
    let mut out = format!("{} (#{})\n", profile.display_name(), profile.id);
    let _ = writeln!(out, "  username: {}", profile.username);
    let _ = writeln!(out, "  email:    {}", profile.email);
    let _ = write!(
        out,
        "  role:     {}{}",
        profile.role,
        if profile.is_admin() { " (admin)" } else { "" }
    );
    out
}

fn page_footer<T>(page: &Page<T>, noun: &str) -> String {
    if page.empty {
        return format!("No {noun} found.");
    }
    format!(
        "Page {} of {} ({} {noun} total){}",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements,
        if page.has_next() { ", more available with --page" } else { "" }
    )
}

#[must_use]
pub fn artists(page: &Page<Artist>) -> String {
    let mut out = String::new();
    for artist in &page.content {
        let _ = write!(out, "{:>5}  {}", artist.id, artist.name);
        if let Some(genre) = &artist.genre {
            let _ = write!(out, "  [{genre}]");
        }
        if let Some(country) = &artist.country {
            let _ = write!(out, "  {country}");
        }
        let albums = artist.album_count.map_or(artist.albums.len(), |n| n as usize);
        let _ = writeln!(out, "  {albums} album(s)");
    }
    out.push_str(&page_footer(page, "artists"));
    out
}

#[must_use]
pub fn albums(page: &Page<Album>) -> String {
    let mut out = String::new();
    for album in &page.content {
        let _ = write!(out, "{:>5}  {}", album.id, album.title);
        if let Some(year) = album.release_year {
            let _ = write!(out, " ({year})");
        }
        if !album.artists.is_empty() {
            let names: Vec<&str> = album.artists.iter().map(|a| a.name.as_str()).collect();
            let _ = write!(out, "  by {}", names.join(", "));
        }
        if !album.covers.is_empty() {
            let _ = write!(out, "  {} cover(s)", album.covers.len());
        }
        out.push('\n');
    }
    out.push_str(&page_footer(page, "albums"));
    out
}

const fn kind_marker(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Created => "+",
        NotificationKind::Updated => "~",
        NotificationKind::Deleted => "-",
    }
}

/// One line per notification.
#[must_use]
pub fn notification(notification: &Notification) -> String {
    let mut line = format!(
        "[{}] {} {}",
        notification.timestamp.format(TIMESTAMP_FORMAT),
        kind_marker(notification.kind),
        notification.message
    );
    if let Some(id) = notification.referenced_album_id() {
        let _ = write!(line, " (album #{id})");
    }
    line
}

/// Title and body for a desktop notification.
#[must_use]
pub fn desktop_message(notification: &Notification) -> (String, String) {
    let title = format!("Album {}", notification.kind);
    let body = notification.album.as_ref().map_or_else(
        || notification.message.clone(),
        |album| format!("{}\n{}", album.title, notification.message),
    );
    (title, body)
}

#[must_use]
pub fn connection(state: ConnectionState) -> String {
    match state {
        ConnectionState::Connected => "Live: waiting for album changes".to_string(),
        other => format!("Channel: {other}"),
    }
}

#[must_use]
pub fn buffer_summary(buffer: &NotificationBuffer) -> String {
    if buffer.is_empty() {
        return "No notifications received.".to_string();
    }

    let mut out = format!(
        "{} notification(s) kept (most recent first, capacity {}):",
        buffer.len(),
        buffer.capacity()
    );
    for entry in buffer.iter() {
        out.push_str("\n  ");
        out.push_str(&notification(entry));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::AlbumId;
    use chrono::NaiveDate;

    fn at_noon(n: Notification) -> Notification {
        n.with_timestamp(
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_notification_line() {
        let n = at_noon(
            Notification::new(NotificationKind::Deleted, "Album removed").with_album_id(AlbumId(7)),
        );

        assert_eq!(
            notification(&n),
            "[2024-05-01 12:00:00] - Album removed (album #7)"
        );
    }

    #[test]
    fn test_desktop_message_prefers_snapshot_title() {
        let payload = r#"{"type":"NEW_ALBUM","message":"New album","album":{"id":1,"title":"Meteora"}}"#;
        let n = Notification::from_json(payload).unwrap();

        let (title, body) = desktop_message(&n);

        assert_eq!(title, "Album created");
        assert_eq!(body, "Meteora\nNew album");
    }

    #[test]
    fn test_empty_pages() {
        let page: Page<Album> = serde_json::from_str(
            r#"{"content":[],"totalElements":0,"totalPages":0,"size":10,"number":0,"empty":true}"#,
        )
        .unwrap();

        assert_eq!(albums(&page), "No albums found.");
    }

    #[test]
    fn test_artist_listing() {
        let page: Page<Artist> = serde_json::from_str(
            r#"{"content":[{"id":3,"name":"Linkin Park","genre":"Rock","albumCount":2}],
                "totalElements":11,"totalPages":2,"size":10,"number":0,"first":true,"last":false}"#,
        )
        .unwrap();

        let output = artists(&page);

        assert!(output.contains("Linkin Park  [Rock]  2 album(s)"));
        assert!(output.ends_with("Page 1 of 2 (11 artists total), more available with --page"));
    }

    #[test]
    fn test_buffer_summary_order() {
        let mut buffer = NotificationBuffer::default();
        buffer.push(at_noon(Notification::new(NotificationKind::Created, "New album: Meteora")));
        buffer.push(at_noon(Notification::new(NotificationKind::Updated, "Album updated: Mutter")));

        let summary = buffer_summary(&buffer);
        let lines: Vec<&str> = summary.lines().collect();

        assert!(lines[0].starts_with("2 notification(s) kept"));
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("~ Album updated: Mutter"));
        assert!(lines[2].ends_with("+ New album: Meteora"));
    }
}
