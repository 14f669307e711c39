//! Catalog API error types.

use thiserror::Error;

/// Errors surfaced by the HTTP gateway, the session manager and the catalog client.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },

    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("rate limited by the catalog API: {message}")]
    RateLimited { message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("request rejected: {message}")]
    Rejected { message: String },

    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("credential storage error: {0}")]
    Storage(#[from] super::StorageError),

    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl ApiError {
    /// Creates invalid credentials error.
    #[must_use]
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            message: message.into(),
        }
    }

    /// Creates status error.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::InvalidCredentials { .. } => Some(401),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Returns whether retrying the same call later may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::RateLimited { .. })
    }

    /// Returns whether the user has to authenticate again.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::InvalidCredentials { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ApiError::network("down").is_recoverable());
        assert!(!ApiError::SessionExpired.is_recoverable());
        assert!(ApiError::SessionExpired.requires_login());
        assert!(ApiError::invalid_credentials("bad").requires_login());
        assert!(!ApiError::status(404, "missing").requires_login());
    }

    #[test]
    fn test_status_code() {
        assert_eq!(ApiError::status(404, "missing").status_code(), Some(404));
        assert_eq!(ApiError::invalid_credentials("bad").status_code(), Some(401));
        assert_eq!(ApiError::decode("eof").status_code(), None);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ApiError::validation("email", "must be a valid address").to_string(),
            "invalid email: must be a valid address"
        );
    }
}
