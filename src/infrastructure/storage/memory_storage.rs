//! Process-local credential storage.

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::entities::StoredSession;
use crate::domain::errors::StorageError;
use crate::domain::ports::CredentialStoragePort;

/// Keeps the session for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryCredentialStorage {
    session: RwLock<Option<StoredSession>>,
}

impl MemoryCredentialStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStoragePort for MemoryCredentialStorage {
    async fn load(&self) -> Result<Option<StoredSession>, StorageError> {
        Ok(self.session.read().clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), StorageError> {
        debug!("Keeping session in memory");
        *self.session.write() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.session.write().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Credential, CredentialPair};

    #[tokio::test]
    async fn test_memory_storage_lifecycle() {
        let storage = MemoryCredentialStorage::new();
        let session = StoredSession::new(
            CredentialPair::new(
                Credential::new_unchecked("access"),
                Credential::new_unchecked("refresh"),
            ),
            None,
        );

        assert!(!storage.has_session().await.unwrap());
        storage.save(&session).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some(session));

        storage.clear().await.unwrap();
        storage.clear().await.unwrap();
        assert!(!storage.has_session().await.unwrap());
    }
}
