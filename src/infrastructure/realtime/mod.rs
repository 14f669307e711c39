//! Live album notifications over STOMP.

mod client;
mod codec;
mod connection;
mod constants;
mod error;
mod heartbeat;
mod registry;

pub use client::{ChannelConfig, NotificationChannel};
pub use codec::{StompCommand, StompFrame, decode as decode_frames};
pub use connection::{BusConnection, BusConnector, StompConnector};
pub use constants::{DEFAULT_TOPIC, DEFAULT_WS_URL};
pub use error::{ChannelError, ChannelResult};
pub use heartbeat::Heartbeat;
pub use registry::{ListenerRegistry, NotificationCallback, Subscription};
