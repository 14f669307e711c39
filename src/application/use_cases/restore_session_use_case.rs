//! Session restoration use case.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::{AuthResponse, SessionSource};
use crate::application::services::TokenStore;

/// Restores a previously persisted session at startup.
pub struct RestoreSessionUseCase {
    token_store: Arc<TokenStore>,
}

impl RestoreSessionUseCase {
    /// Creates new use case.
    #[must_use]
    pub const fn new(token_store: Arc<TokenStore>) -> Self {
        Self { token_store }
    }

    /// Loads stored credentials without contacting the server.
    ///
    /// Validity is confirmed by the first authenticated request. Storage
    /// failures are treated as an absent session.
    pub async fn execute(&self) -> Option<AuthResponse> {
        debug!("Checking storage for a persisted session");
        match self.token_store.restore().await {
            Ok(Some(session)) => {
                info!(
                    username = session.user.as_ref().map_or("<unknown>", |u| u.username.as_str()),
                    "Using session from storage"
                );
                Some(AuthResponse::new(session.user, SessionSource::Storage, true))
            }
            Ok(None) => {
                debug!("No persisted session found");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                None
            }
        }
    }
}
