//! Credential storage error types.

use thiserror::Error;

/// Credential storage error variants.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access secure storage: {0}")]
    AccessFailed(String),

    #[error("failed to retrieve credentials: {0}")]
    RetrievalFailed(String),

    #[error("failed to store credentials: {0}")]
    StorageFailed(String),

    #[error("failed to delete credentials: {0}")]
    DeletionFailed(String),

    #[error("stored credentials are corrupt: {0}")]
    Corrupt(String),
}
