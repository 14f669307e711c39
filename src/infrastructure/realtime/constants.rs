use std::time::Duration;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws/websocket";
pub const DEFAULT_TOPIC: &str = "/topic/albums";

pub const STOMP_VERSION: &str = "1.2";

pub const HEARTBEAT_OUTGOING: Duration = Duration::from_millis(4000);
pub const HEARTBEAT_INCOMING: Duration = Duration::from_millis(4000);
pub const HEARTBEAT_TIMEOUT_MULTIPLIER: f64 = 1.5;

pub const RECONNECT_DELAY_BASE: Duration = Duration::from_millis(1000);
pub const RECONNECT_DELAY_MAX: Duration = Duration::from_millis(30_000);
pub const RECONNECT_JITTER_MAX: Duration = Duration::ZERO;
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
