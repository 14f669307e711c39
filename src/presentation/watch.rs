//! Session-gated live notification loop.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::console;
use crate::application::{NotificationBuffer, SessionManager};
use crate::domain::errors::ApiError;
use crate::domain::{ConnectionState, DesktopNotifierPort, Notification, NotificationKind};
use crate::infrastructure::http::AlbumsApi;
use crate::infrastructure::realtime::NotificationChannel;

/// Why the watch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    SessionEnded,
    ChannelGaveUp,
    LimitReached,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupted => write!(f, "interrupted"),
            Self::SessionEnded => write!(f, "session ended, log in again"),
            Self::ChannelGaveUp => write!(f, "notification channel gave up reconnecting"),
            Self::LimitReached => write!(f, "notification limit reached"),
        }
    }
}

#[derive(Debug)]
pub struct WatchOutcome {
    pub reason: StopReason,
    pub received: usize,
    pub buffer: NotificationBuffer,
}

pub struct Watcher {
    session: Arc<SessionManager>,
    channel: Arc<NotificationChannel>,
    notifier: Arc<dyn DesktopNotifierPort>,
    albums: Option<AlbumsApi>,
    limit: Option<usize>,
    buffer: NotificationBuffer,
    received: usize,
}

impl Watcher {
    #[must_use]
    pub fn new(
        session: Arc<SessionManager>,
        channel: Arc<NotificationChannel>,
        notifier: Arc<dyn DesktopNotifierPort>,
    ) -> Self {
        Self {
            session,
            channel,
            notifier,
            albums: None,
            limit: None,
            buffer: NotificationBuffer::default(),
            received: 0,
        }
    }

    /// Fetches the album when a notification carries only its id.
    #[must_use]
    pub fn with_album_lookup(mut self, albums: AlbumsApi) -> Self {
        self.albums = Some(albums);
        self
    }

    /// Stops after `limit` notifications.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Connects the channel and prints notifications until `shutdown`
    /// resolves, the session ends or the channel gives up. The channel is
    /// always disconnected before returning.
    ///
    /// # Errors
    ///
    /// Returns `SessionExpired` when started without an authenticated session.
    pub async fn run<F>(mut self, shutdown: F) -> Result<WatchOutcome, ApiError>
    where
        F: Future<Output = ()>,
    {
        if !self.session.is_authenticated() {
            return Err(ApiError::SessionExpired);
        }

        let (forward, mut incoming) = mpsc::unbounded_channel::<Notification>();
        let subscription = self.channel.on_notification(move |notification| {
            let _ = forward.send(notification.clone());
        });
        let mut session_states = self.session.subscribe();
        let mut connection_states = self.channel.subscribe_state();

        self.channel.connect().await;
        tokio::pin!(shutdown);

        let reason = loop {
            tokio::select! {
                () = &mut shutdown => break StopReason::Interrupted,
                changed = session_states.changed() => {
                    if changed.is_err() || !self.session.is_authenticated() {
                        break StopReason::SessionEnded;
                    }
                }
                changed = connection_states.changed() => {
                    if changed.is_err() {
                        break StopReason::ChannelGaveUp;
                    }
                    let state = *connection_states.borrow_and_update();
                    println!("{}", console::connection(state));
                    if state == ConnectionState::Disconnected {
                        break StopReason::ChannelGaveUp;
                    }
                }
                Some(notification) = incoming.recv() => {
                    self.deliver(notification).await;
                    if self.limit.is_some_and(|limit| self.received >= limit) {
                        break StopReason::LimitReached;
                    }
                }
            }
        };

        info!(%reason, received = self.received, "Stopping watch");
        self.channel.disconnect().await;
        subscription.unsubscribe();

        Ok(WatchOutcome {
            reason,
            received: self.received,
            buffer: self.buffer,
        })
    }

    async fn deliver(&mut self, notification: Notification) {
        let notification = self.complete(notification).await;

        println!("{}", console::notification(&notification));
        let (title, body) = console::desktop_message(&notification);
        self.notifier.send(&title, &body);

        self.buffer.push(notification);
        self.received += 1;
    }

    async fn complete(&self, mut notification: Notification) -> Notification {
        let Some(albums) = &self.albums else {
            return notification;
        };
        if notification.album.is_some() || notification.kind == NotificationKind::Deleted {
            return notification;
        }
        let Some(id) = notification.album_id else {
            return notification;
        };

        match albums.get(id).await {
            Ok(album) => {
                debug!(album = %id, "Resolved album snapshot");
                notification.album = Some(album);
            }
            Err(e) => warn!(album = %id, error = %e, "Could not resolve album"),
        }
        notification
    }
}
