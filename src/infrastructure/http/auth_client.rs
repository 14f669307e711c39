//! Catalog API authentication client.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::dto::{LoginRequest, RegisterRequest, TokenResponse};
use super::gateway::{ApiRequest, HttpGateway};
use crate::domain::entities::{LoginCredentials, Registration, TokenGrant};
use crate::domain::errors::ApiError;
use crate::domain::ports::AuthPort;

const LOGIN_PATH: &str = "/api/v1/auth/login";
const REGISTER_PATH: &str = "/api/v1/auth/register";

/// Credential exchange over the unauthenticated auth endpoints.
pub struct CatalogAuthClient {
    gateway: Arc<HttpGateway>,
}

impl CatalogAuthClient {
    #[must_use]
    pub const fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl AuthPort for CatalogAuthClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenGrant, ApiError> {
        debug!(username = %credentials.username, "Requesting credential pair");

        let request = ApiRequest::post(LOGIN_PATH)
            .unauthenticated()
            .json(&LoginRequest {
                username: &credentials.username,
                password: credentials.password.as_str(),
            })?;

        self.gateway
            .send::<TokenResponse>(request)
            .await?
            .into_grant()
    }

    async fn register(&self, registration: &Registration) -> Result<TokenGrant, ApiError> {
        debug!(username = %registration.username, "Registering account");

        let request = ApiRequest::post(REGISTER_PATH)
            .unauthenticated()
            .json(&RegisterRequest {
                username: &registration.username,
                email: &registration.email,
                password: registration.password.as_str(),
                full_name: registration.full_name.as_deref(),
            })?;

        self.gateway
            .send::<TokenResponse>(request)
            .await?
            .into_grant()
    }
}
