//! Keyring-based credential storage.

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use super::record::{
    ACCESS_TOKEN_KEY, ALL_KEYS, REFRESH_TOKEN_KEY, SessionRecord, TOKEN_TYPE_KEY, USER_KEY,
};
use crate::domain::entities::StoredSession;
use crate::domain::errors::StorageError;
use crate::domain::ports::CredentialStoragePort;

const KEYRING_SERVICE: &str = "albumwire";

/// System keyring adapter, one entry per key.
pub struct KeyringCredentialStorage {
    service: String,
}

impl KeyringCredentialStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    /// Creates storage under a custom service name.
    #[must_use]
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Entry::new(&self.service, key)
            .map_err(|e| StorageError::AccessFailed(format!("failed to access keyring: {e}")))
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                warn!(key, error = %e, "Failed to read keyring entry");
                Err(StorageError::RetrievalFailed(e.to_string()))
            }
        }
    }

    fn write(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        let Some(value) = value else {
            return self.delete(key);
        };

        self.entry(key)?.set_password(value).map_err(|e| {
            warn!(key, error = %e, "Failed to write keyring entry");
            StorageError::StorageFailed(e.to_string())
        })
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => {
                warn!(key, error = %e, "Failed to delete keyring entry");
                Err(StorageError::DeletionFailed(e.to_string()))
            }
        }
    }
}

impl Default for KeyringCredentialStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStoragePort for KeyringCredentialStorage {
    async fn load(&self) -> Result<Option<StoredSession>, StorageError> {
        debug!(service = %self.service, "Loading session from keyring");

        let record = SessionRecord {
            access_token: self.read(ACCESS_TOKEN_KEY)?,
            refresh_token: self.read(REFRESH_TOKEN_KEY)?,
            token_type: self.read(TOKEN_TYPE_KEY)?,
            user: self.read(USER_KEY)?,
        };

        let session = record.into_session();
        debug!(found = session.is_some(), "Keyring lookup finished");
        Ok(session)
    }

    async fn save(&self, session: &StoredSession) -> Result<(), StorageError> {
        debug!(service = %self.service, "Storing session in keyring");

        let record = SessionRecord::from_session(session)?;
        self.write(ACCESS_TOKEN_KEY, record.access_token.as_deref())?;
        self.write(REFRESH_TOKEN_KEY, record.refresh_token.as_deref())?;
        self.write(TOKEN_TYPE_KEY, record.token_type.as_deref())?;
        self.write(USER_KEY, record.user.as_deref())?;

        debug!("Session stored");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        debug!(service = %self.service, "Clearing keyring entries");

        let mut first_error = None;
        for key in ALL_KEYS {
            if let Err(e) = self.delete(key) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Credential, CredentialPair, UserProfile};

    #[tokio::test]
    #[ignore = "requires system keyring"]
    async fn test_save_load_clear() {
        let storage = KeyringCredentialStorage::with_service("albumwire-test");
        let session = StoredSession::new(
            CredentialPair::new(
                Credential::new_unchecked("access-test"),
                Credential::new_unchecked("refresh-test"),
            ),
            Some(UserProfile::new(7, "tester", "t@albumwire.dev", "USER")),
        );

        storage.save(&session).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some(session));

        storage.clear().await.unwrap();
        storage.clear().await.unwrap();
        assert!(storage.load().await.unwrap().is_none());
    }
}
