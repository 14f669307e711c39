use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::connection::{BusConnection, BusConnector, StompConnector};
use super::constants::{
    DEFAULT_TOPIC, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_BASE, RECONNECT_DELAY_MAX,
    RECONNECT_JITTER_MAX,
};
use super::error::{ChannelError, ChannelResult};
use super::registry::{ListenerRegistry, Subscription};
use crate::domain::{ConnectionState, Notification};

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub topic: String,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    pub jitter_max: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            base_delay: RECONNECT_DELAY_BASE,
            max_delay: RECONNECT_DELAY_MAX,
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            jitter_max: RECONNECT_JITTER_MAX,
        }
    }
}

impl ChannelConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    #[must_use]
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    #[must_use]
    pub const fn with_jitter(mut self, jitter_max: Duration) -> Self {
        self.jitter_max = jitter_max;
        self
    }

    /// Delay before the next attempt, given how many consecutive attempts
    /// already failed. Never exceeds `max_delay`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn backoff_delay(&self, failed_attempts: u32) -> Duration {
        let base_delay = self.base_delay.as_millis() as u64;
        let max_delay = self.max_delay.as_millis() as u64;
        let jitter_max = self.jitter_max.as_millis() as u64;

        let exponential_delay =
            base_delay.saturating_mul(2_u64.saturating_pow(failed_attempts.min(32)));
        let capped_delay = exponential_delay.min(max_delay);

        let total_delay = capped_delay.saturating_add(rand_jitter(jitter_max)).min(max_delay);
        Duration::from_millis(total_delay)
    }
}

fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;

    if max == 0 {
        return 0;
    }

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);

    nanos % max
}

struct Shared {
    connector: Arc<dyn BusConnector>,
    config: ChannelConfig,
    registry: Arc<ListenerRegistry>,
    state: watch::Sender<ConnectionState>,
    attempts: AtomicU32,
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Channel state changed");
        }
    }
}

struct ChannelTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Persistent subscription to the album topic, with automatic
/// reconnection and listener fan-out.
pub struct NotificationChannel {
    shared: Arc<Shared>,
    task: Mutex<Option<ChannelTask>>,
}

impl NotificationChannel {
    #[must_use]
    pub fn new(connector: Arc<dyn BusConnector>, config: ChannelConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                connector,
                config,
                registry: Arc::new(ListenerRegistry::new()),
                state,
                attempts: AtomicU32::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    /// Channel speaking STOMP to the broker at `url`.
    #[must_use]
    pub fn stomp(url: impl Into<String>, config: ChannelConfig) -> Self {
        Self::new(Arc::new(StompConnector::new(url)), config)
    }

    /// Starts the connection task. No-op while connecting or connected;
    /// while waiting to reconnect, skips the remaining delay.
    pub async fn connect(&self) {
        let mut task = self.task.lock().await;

        let previous = *self.shared.state.borrow();
        if previous.is_active() {
            debug!(state = %previous, "Channel already active");
            return;
        }

        if let Some(stale) = task.take() {
            stale.cancel.cancel();
            let _ = stale.handle.await;
        }

        if previous == ConnectionState::Disconnected {
            self.shared.attempts.store(0, Ordering::SeqCst);
        }

        info!(topic = %self.shared.config.topic, "Connecting notification channel");
        self.shared.set_state(ConnectionState::Connecting);

        let cancel = CancellationToken::new();
        let handle = spawn_channel_loop(self.shared.clone(), cancel.clone());
        *task = Some(ChannelTask { cancel, handle });
    }

    /// Tears the connection down and waits for the task to finish. No
    /// reconnection happens afterwards until the next `connect()`.
    pub async fn disconnect(&self) {
        let mut task = self.task.lock().await;

        if let Some(running) = task.take() {
            running.cancel.cancel();
            if let Err(e) = running.handle.await {
                warn!(error = %e, "Channel task ended abnormally");
            }
        }

        self.shared.attempts.store(0, Ordering::SeqCst);
        let previous = self.shared.state.send_replace(ConnectionState::Disconnected);
        if previous != ConnectionState::Disconnected {
            info!("Notification channel disconnected");
        }
    }

    /// Registers a listener for every incoming notification.
    pub fn on_notification<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.shared.registry.register(Box::new(callback))
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Consecutive failed attempts since the last successful connection.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.registry.len()
    }

    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.shared.config
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.cancel.cancel();
        }
    }
}

fn spawn_channel_loop(shared: Arc<Shared>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result =
            std::panic::AssertUnwindSafe(run_channel_loop(shared.clone(), cancel)).catch_unwind();

        if let Err(panic_info) = result.await {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };

            error!(panic = %panic_msg, "Channel task panicked");
            shared.set_state(ConnectionState::Disconnected);
        }
    })
}

async fn run_channel_loop(shared: Arc<Shared>, cancel: CancellationToken) {
    loop {
        shared.set_state(ConnectionState::Connecting);

        let established = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            established = establish(&shared) => established,
        };

        match established {
            Ok(mut connection) => {
                shared.attempts.store(0, Ordering::SeqCst);
                shared.set_state(ConnectionState::Connected);
                info!(topic = %shared.config.topic, "Notification channel connected");

                let failure = tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        connection.close().await;
                        break;
                    }
                    failure = pump(connection.as_mut(), &shared.registry) => failure,
                };

                warn!(error = %failure, "Notification channel lost");
                connection.close().await;
            }
            Err(e) => {
                warn!(error = %e, "Connection attempt failed");
            }
        }

        let failed = shared.attempts.load(Ordering::SeqCst);
        if failed >= shared.config.max_attempts {
            error!(
                attempts = failed,
                "Max reconnection attempts exceeded, giving up"
            );
            shared.set_state(ConnectionState::Disconnected);
            break;
        }

        let delay = shared.config.backoff_delay(failed);
        let attempt = failed + 1;
        shared.attempts.store(attempt, Ordering::SeqCst);
        shared.set_state(ConnectionState::Reconnecting { attempt });
        info!(
            attempt,
            max_attempts = shared.config.max_attempts,
            delay_ms = delay.as_millis(),
            "Reconnecting notification channel"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = sleep(delay) => {}
        }
    }

    debug!("Channel loop terminated");
}

async fn establish(shared: &Shared) -> ChannelResult<Box<dyn BusConnection>> {
    let mut connection = shared.connector.connect().await?;
    if let Err(e) = connection.subscribe(&shared.config.topic).await {
        connection.close().await;
        return Err(e);
    }
    Ok(connection)
}

/// Delivers messages until the transport fails.
async fn pump(connection: &mut dyn BusConnection, registry: &ListenerRegistry) -> ChannelError {
    loop {
        let body = match connection.next_message().await {
            Ok(body) => body,
            Err(e) => return e,
        };

        match Notification::from_json(&body) {
            Ok(notification) => {
                debug!(kind = %notification.kind, "Notification received");
                registry.dispatch(&notification);
            }
            Err(e) => {
                let error = ChannelError::from(e);
                warn!(error = %error, "Dropping malformed notification");
            }
        }
    }
}
