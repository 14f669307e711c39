//! Authentication inputs and grants.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use zeroize::Zeroizing;

use super::{CredentialPair, UserProfile};
use crate::domain::errors::ApiError;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex"));

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 100;
const PASSWORD_MIN: usize = 6;
const FULL_NAME_MAX: usize = 200;

/// Username and password submitted to the login endpoint.
#[derive(Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl LoginCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into().trim().to_string(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Checks the fields the server requires.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.is_empty() {
            return Err(ApiError::validation("username", "is required"));
        }
        if self.password.is_empty() {
            return Err(ApiError::validation("password", "is required"));
        }
        Ok(())
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// New account submitted to the registration endpoint.
#[derive(Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: Zeroizing<String>,
    pub full_name: Option<String>,
}

impl Registration {
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into().trim().to_string(),
            email: email.into().trim().to_string(),
            password: Zeroizing::new(password.into()),
            full_name: None,
        }
    }

    #[must_use]
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        let full_name = full_name.into().trim().to_string();
        self.full_name = (!full_name.is_empty()).then_some(full_name);
        self
    }

    /// Mirrors the registration constraints enforced by the catalog API.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), ApiError> {
        let username_len = self.username.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&username_len) {
            return Err(ApiError::validation(
                "username",
                format!("must be between {USERNAME_MIN} and {USERNAME_MAX} characters"),
            ));
        }
        if !EMAIL_PATTERN.is_match(&self.email) {
            return Err(ApiError::validation("email", "must be a valid address"));
        }
        if self.password.chars().count() < PASSWORD_MIN {
            return Err(ApiError::validation(
                "password",
                format!("must have at least {PASSWORD_MIN} characters"),
            ));
        }
        if self
            .full_name
            .as_ref()
            .is_some_and(|name| name.chars().count() > FULL_NAME_MAX)
        {
            return Err(ApiError::validation(
                "fullName",
                format!("must have at most {FULL_NAME_MAX} characters"),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Credentials and profile issued by a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub credentials: CredentialPair,
    pub user: UserProfile,
}

impl TokenGrant {
    #[must_use]
    pub fn new(credentials: CredentialPair, user: UserProfile) -> Self {
        Self { credentials, user }
    }
}

/// Session record as kept in persisted client storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub credentials: CredentialPair,
    pub user: Option<UserProfile>,
}

impl StoredSession {
    #[must_use]
    pub fn new(credentials: CredentialPair, user: Option<UserProfile>) -> Self {
        Self { credentials, user }
    }
}

impl From<TokenGrant> for StoredSession {
    fn from(grant: TokenGrant) -> Self {
        Self::new(grant.credentials, Some(grant.user))
    }
}
