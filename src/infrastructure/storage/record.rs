//! Flat string record as kept by the persistent adapters.

use tracing::warn;

use crate::domain::entities::{Credential, CredentialPair, StoredSession, UserProfile};
use crate::domain::errors::StorageError;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const TOKEN_TYPE_KEY: &str = "tokenType";
pub const USER_KEY: &str = "user";

pub const ALL_KEYS: [&str; 4] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_TYPE_KEY, USER_KEY];

/// One string per persisted key.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub user: Option<String>,
}

impl SessionRecord {
    /// # Errors
    ///
    /// Returns `StorageFailed` if the profile cannot be serialized.
    pub fn from_session(session: &StoredSession) -> Result<Self, StorageError> {
        let user = session
            .user
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StorageError::StorageFailed(e.to_string()))?;

        Ok(Self {
            access_token: Some(session.credentials.access.as_str().to_string()),
            refresh_token: Some(session.credentials.refresh.as_str().to_string()),
            token_type: Some(session.credentials.token_type.clone()),
            user,
        })
    }

    /// Rebuilds the session. Without both credentials there is no session;
    /// an unreadable profile is dropped.
    #[must_use]
    pub fn into_session(self) -> Option<StoredSession> {
        let access = self.access_token.as_deref().and_then(Credential::new);
        let refresh = self.refresh_token.as_deref().and_then(Credential::new);

        let (access, refresh) = match (access, refresh) {
            (Some(access), Some(refresh)) => (access, refresh),
            (None, None) => return None,
            _ => {
                warn!("Persisted session is incomplete, ignoring it");
                return None;
            }
        };

        let mut credentials = CredentialPair::new(access, refresh);
        if let Some(token_type) = self.token_type {
            credentials = credentials.with_token_type(token_type);
        }

        let user = self.user.and_then(|json| {
            serde_json::from_str::<UserProfile>(&json)
                .inspect_err(|e| warn!(error = %e, "Persisted user profile is unreadable"))
                .ok()
        });

        Some(StoredSession::new(credentials, user))
    }
}
