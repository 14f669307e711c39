//! Domain layer with core business entities and port definitions.

/// Notification channel connection states.
pub mod connection;
/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Album change notifications.
pub mod notification;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;
/// Session states and events.
pub mod session;

pub use connection::ConnectionState;
pub use entities::{CredentialPair, StoredSession, TokenGrant, UserProfile};
pub use errors::{ApiError, StorageError};
pub use notification::{Notification, NotificationKind};
pub use ports::{AuthPort, CredentialStoragePort, DesktopNotifierPort};
pub use session::{SessionEvent, SessionState};
