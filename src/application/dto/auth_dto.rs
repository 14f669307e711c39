//! Authentication DTOs.

use crate::domain::entities::UserProfile;

/// Where the active session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    /// Username and password exchange.
    Login,
    /// Freshly created account.
    Register,
    /// Credentials restored from persisted storage.
    Storage,
}

impl SessionSource {
    /// Returns human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "registration",
            Self::Storage => "stored credentials",
        }
    }
}

impl std::fmt::Display for SessionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Outcome of an authentication workflow.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    /// Cached profile, absent when restored storage had none.
    pub user: Option<UserProfile>,
    /// Session source.
    pub source: SessionSource,
    /// Whether the credentials reached persisted storage.
    pub persisted: bool,
}

impl AuthResponse {
    /// Creates new auth response.
    #[must_use]
    pub const fn new(user: Option<UserProfile>, source: SessionSource, persisted: bool) -> Self {
        Self {
            user,
            source,
            persisted,
        }
    }

    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .map_or("unknown user", UserProfile::display_name)
    }
}
