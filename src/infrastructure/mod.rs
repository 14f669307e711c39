//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Desktop notifications.
pub mod desktop;
/// Catalog API HTTP client.
pub mod http;
/// Live album notifications.
pub mod realtime;
/// Credential storage adapters.
pub mod storage;

pub use config::{AppConfig, CliArgs, Command, LogLevel, StorageManager};
pub use desktop::DesktopNotifier;
pub use http::{AlbumsApi, ApiRequest, ArtistsApi, CatalogAuthClient, HttpGateway};
pub use realtime::{ChannelConfig, ChannelError, NotificationChannel, StompConnector, Subscription};
#[cfg(feature = "keyring")]
pub use storage::KeyringCredentialStorage;
pub use storage::MemoryCredentialStorage;
