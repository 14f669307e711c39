//! Login and registration use case implementation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::{AuthResponse, SessionSource};
use crate::application::services::TokenStore;
use crate::domain::entities::{LoginCredentials, Registration, TokenGrant};
use crate::domain::errors::ApiError;
use crate::domain::ports::AuthPort;

/// Handles the credential exchange workflows.
#[derive(Clone)]
pub struct LoginUseCase {
    auth_port: Arc<dyn AuthPort>,
    token_store: Arc<TokenStore>,
}

impl LoginUseCase {
    /// Creates new login use case.
    #[must_use]
    pub const fn new(auth_port: Arc<dyn AuthPort>, token_store: Arc<TokenStore>) -> Self {
        Self {
            auth_port,
            token_store,
        }
    }

    /// Exchanges username and password for a session.
    ///
    /// # Errors
    /// Returns error if the request is malformed or the server rejects it.
    pub async fn execute(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        debug!(username = %credentials.username, "Attempting login");

        credentials.validate().inspect_err(|e| {
            warn!(error = %e, "Login request failed local validation");
        })?;

        let grant = self.auth_port.login(credentials).await.inspect_err(|e| {
            warn!(error = %e, "Login rejected");
        })?;

        Ok(self.install(grant, SessionSource::Login).await)
    }

    /// Creates an account and opens its session.
    ///
    /// # Errors
    /// Returns error if the registration is malformed or the server rejects it.
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        debug!(username = %registration.username, "Attempting registration");

        registration.validate().inspect_err(|e| {
            warn!(error = %e, "Registration failed local validation");
        })?;

        let grant = self.auth_port.register(registration).await.inspect_err(|e| {
            warn!(error = %e, "Registration rejected");
        })?;

        Ok(self.install(grant, SessionSource::Register).await)
    }

    async fn install(&self, grant: TokenGrant, source: SessionSource) -> AuthResponse {
        info!(
            user_id = %grant.user.id,
            username = %grant.user.username,
            %source,
            "Successfully authenticated"
        );

        let user = grant.user.clone();
        let persisted = self.token_store.store_grant(grant).await;

        AuthResponse::new(Some(user), source, persisted)
    }
}
