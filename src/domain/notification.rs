use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Album, AlbumId};
use crate::domain::serde_utils::local_datetime;

/// What happened to the referenced album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "NEW_ALBUM")]
    Created,
    #[serde(rename = "ALBUM_UPDATED")]
    Updated,
    #[serde(rename = "ALBUM_DELETED")]
    Deleted,
}

impl NotificationKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Album change event pushed by the catalog server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<Album>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<AlbumId>,
    #[serde(default = "now", with = "local_datetime")]
    pub timestamp: NaiveDateTime,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl Notification {
    #[must_use]
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            album: None,
            album_id: None,
            timestamp: now(),
        }
    }

    #[must_use]
    pub fn with_album(mut self, album: Album) -> Self {
        self.album = Some(album);
        self
    }

    #[must_use]
    pub const fn with_album_id(mut self, album_id: AlbumId) -> Self {
        self.album_id = Some(album_id);
        self
    }

    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Parses a pushed JSON payload.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the payload is not a valid notification.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Id of the referenced album, from the snapshot or the bare id.
    #[must_use]
    pub fn referenced_album_id(&self) -> Option<AlbumId> {
        self.album.as_ref().map(|album| album.id).or(self.album_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_created_with_snapshot() {
        let payload = r#"{
            "type": "NEW_ALBUM",
            "message": "New album: Mutter",
            "album": {"id": 4, "title": "Mutter", "releaseYear": 2001},
            "timestamp": "2024-05-01T10:00:00.5"
        }"#;

        let n = Notification::from_json(payload).unwrap();

        assert_eq!(n.kind, NotificationKind::Created);
        assert_eq!(n.referenced_album_id(), Some(AlbumId(4)));
        assert_eq!(n.album.unwrap().title, "Mutter");
    }

    #[test]
    fn test_parse_server_album_with_null_collections() {
        let payload = r#"{"type":"NEW_ALBUM","message":"New album: Meteora","album":{"id":7,"title":"Meteora","releaseYear":2003,"genre":"Rock","recordLabel":null,"totalTracks":13,"description":null,"artists":null,"covers":null,"createdAt":"2024-05-01T10:00:00","updatedAt":"2024-05-01T10:00:00"},"albumId":null,"timestamp":"2024-05-01T10:00:00.123"}"#;

        let n = Notification::from_json(payload).unwrap();

        let album = n.album.as_ref().unwrap();
        assert_eq!(n.referenced_album_id(), Some(AlbumId(7)));
        assert!(album.artists.is_empty());
        assert!(album.covers.is_empty());
    }

    #[test]
    fn test_parse_deleted_with_bare_id() {
        let payload = r#"{"type":"ALBUM_DELETED","message":"Album removed: X","albumId":9,"timestamp":[2024,5,1,10,0,0]}"#;

        let n = Notification::from_json(payload).unwrap();

        assert_eq!(n.kind, NotificationKind::Deleted);
        assert_eq!(n.referenced_album_id(), Some(AlbumId(9)));
        assert!(n.album.is_none());
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let before = Local::now().naive_local();
        let n = Notification::from_json(r#"{"type":"ALBUM_UPDATED","message":"m"}"#).unwrap();

        assert!(n.timestamp >= before);
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        assert!(Notification::from_json("not json").is_err());
        assert!(Notification::from_json(r#"{"type":"ARTIST_CREATED","message":"m"}"#).is_err());
        assert!(Notification::from_json(r#"{"message":"m"}"#).is_err());
    }
}
