//! Credential storage port definition.

use async_trait::async_trait;

use crate::domain::entities::StoredSession;
use crate::domain::errors::StorageError;

/// Port for persisting the session between runs.
#[async_trait]
pub trait CredentialStoragePort: Send + Sync {
    /// Loads the persisted session, `None` when nothing is stored.
    async fn load(&self) -> Result<Option<StoredSession>, StorageError>;

    /// Persists the session, replacing any previous record.
    async fn save(&self, session: &StoredSession) -> Result<(), StorageError>;

    /// Removes every persisted entry. Clearing empty storage succeeds.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Checks if a session is persisted.
    async fn has_session(&self) -> Result<bool, StorageError> {
        Ok(self.load().await?.is_some())
    }
}
