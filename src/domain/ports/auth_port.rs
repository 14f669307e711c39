//! Authentication port definition.

use async_trait::async_trait;

use crate::domain::entities::{LoginCredentials, Registration, TokenGrant};
use crate::domain::errors::ApiError;

/// Port for the catalog authentication endpoints.
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Exchanges username and password for a credential pair.
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenGrant, ApiError>;

    /// Creates an account and returns its first credential pair.
    async fn register(&self, registration: &Registration) -> Result<TokenGrant, ApiError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::entities::{Credential, CredentialPair, UserProfile};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Mock authentication port for testing.
    pub struct MockAuthPort {
        should_succeed: Arc<AtomicBool>,
        calls: AtomicUsize,
        user: UserProfile,
    }

    impl MockAuthPort {
        /// Creates new mock.
        pub fn new(should_succeed: bool) -> Self {
            Self {
                should_succeed: Arc::new(AtomicBool::new(should_succeed)),
                calls: AtomicUsize::new(0),
                user: UserProfile::new(1, "user", "user@albumwire.dev", "USER"),
            }
        }

        /// Sets success behavior.
        pub fn set_should_succeed(&self, value: bool) {
            self.should_succeed.store(value, Ordering::SeqCst);
        }

        /// Number of login and register calls received.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn grant(&self, username: &str) -> Result<TokenGrant, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.should_succeed.load(Ordering::SeqCst) {
                return Err(ApiError::invalid_credentials("Invalid username or password"));
            }
            let mut user = self.user.clone();
            user.username = username.to_string();
            Ok(TokenGrant::new(
                CredentialPair::new(
                    Credential::new_unchecked("mock-access"),
                    Credential::new_unchecked("mock-refresh"),
                )
                .with_expires_in(300),
                user,
            ))
        }
    }

    #[async_trait]
    impl AuthPort for MockAuthPort {
        async fn login(&self, credentials: &LoginCredentials) -> Result<TokenGrant, ApiError> {
            self.grant(&credentials.username)
        }

        async fn register(&self, registration: &Registration) -> Result<TokenGrant, ApiError> {
            self.grant(&registration.username)
        }
    }
}
