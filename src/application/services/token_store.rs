//! In-memory owner of the current credential pair.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info};

use crate::domain::entities::{Credential, CredentialPair, StoredSession, TokenGrant, UserProfile};
use crate::domain::errors::StorageError;
use crate::domain::ports::CredentialStoragePort;

#[derive(Default)]
struct Inner {
    session: Option<StoredSession>,
    generation: u64,
}

/// Current `Authorization` header paired with the generation it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationSnapshot {
    pub header: Option<String>,
    pub generation: u64,
}

/// Source of truth for the active session.
///
/// Every mutation bumps the generation counter so callers can tell whether
/// the credentials they used are still current. The lock is never held
/// across an await point; persistence happens after the in-memory update.
pub struct TokenStore {
    inner: RwLock<Inner>,
    storage: Arc<dyn CredentialStoragePort>,
}

impl TokenStore {
    #[must_use]
    pub fn new(storage: Arc<dyn CredentialStoragePort>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            storage,
        }
    }

    /// Loads the persisted session into memory.
    ///
    /// # Errors
    ///
    /// Returns error if the storage backend cannot be read.
    pub async fn restore(&self) -> Result<Option<StoredSession>, StorageError> {
        let stored = self.storage.load().await?;

        let mut inner = self.inner.write();
        inner.session.clone_from(&stored);
        inner.generation += 1;

        debug!(present = stored.is_some(), "Restored session from storage");
        Ok(stored)
    }

    #[must_use]
    pub fn authorization(&self) -> AuthorizationSnapshot {
        let inner = self.inner.read();
        AuthorizationSnapshot {
            header: inner
                .session
                .as_ref()
                .map(|session| session.credentials.authorization_header()),
            generation: inner.generation,
        }
    }

    #[must_use]
    pub fn access_credential(&self) -> Option<Credential> {
        self.inner
            .read()
            .session
            .as_ref()
            .map(|session| session.credentials.access.clone())
    }

    #[must_use]
    pub fn refresh_credential(&self) -> Option<Credential> {
        self.inner
            .read()
            .session
            .as_ref()
            .map(|session| session.credentials.refresh.clone())
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.inner
            .read()
            .session
            .as_ref()
            .and_then(|session| session.user.clone())
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.inner.read().session.is_some()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Installs a freshly issued grant and persists it.
    ///
    /// Returns whether persistence succeeded; the in-memory session is
    /// valid either way.
    pub async fn store_grant(&self, grant: TokenGrant) -> bool {
        let session = StoredSession::from(grant);
        {
            let mut inner = self.inner.write();
            inner.session = Some(session.clone());
            inner.generation += 1;
        }

        self.persist(&session).await
    }

    /// Swaps in rotated credentials, keeping the cached profile.
    ///
    /// The swap only happens while the store is still at
    /// `expected_generation`; a logout or another rotation in between wins.
    /// Returns whether the credentials were installed.
    pub async fn replace_credentials(
        &self,
        expected_generation: u64,
        credentials: CredentialPair,
    ) -> bool {
        let session = {
            let mut inner = self.inner.write();
            if inner.generation != expected_generation {
                debug!(
                    expected = expected_generation,
                    current = inner.generation,
                    "Discarding rotated credentials for stale generation"
                );
                return false;
            }
            let Some(session) = inner.session.as_mut() else {
                return false;
            };
            session.credentials = credentials;
            let session = session.clone();
            inner.generation += 1;
            session
        };

        self.persist(&session).await;
        true
    }

    /// Drops the session from memory and persisted storage.
    ///
    /// # Errors
    ///
    /// Returns error if persisted entries cannot be removed. Memory is
    /// cleared regardless.
    pub async fn clear(&self) -> Result<(), StorageError> {
        {
            let mut inner = self.inner.write();
            inner.session = None;
            inner.generation += 1;
        }

        match self.storage.clear().await {
            Ok(()) => {
                info!("Session cleared from storage");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to clear session from storage");
                Err(e)
            }
        }
    }

    async fn persist(&self, session: &StoredSession) -> bool {
        match self.storage.save(session).await {
            Ok(()) => {
                debug!("Session persisted to storage");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to persist session to storage");
                false
            }
        }
    }
}
