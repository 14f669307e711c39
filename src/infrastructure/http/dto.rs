//! Catalog API wire types.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Credential, CredentialPair, TokenGrant, UserProfile};
use crate::domain::errors::ApiError;

/// Envelope wrapping every catalog API response body.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

const fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the payload of a successful envelope.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` when the server flagged the call as failed and
    /// `Decode` when the payload is missing.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected {
                message: self.message.unwrap_or_else(|| "request was not successful".to_string()),
            });
        }
        self.data
            .ok_or_else(|| ApiError::decode("response envelope carries no data"))
    }

    /// Checks the success flag, discarding the payload.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` when the server flagged the call as failed.
    pub fn into_unit(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                message: self.message.unwrap_or_else(|| "request was not successful".to_string()),
            })
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

/// Payload of the login, register and refresh endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl TokenResponse {
    /// Converts the raw tokens into a validated credential pair.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if either token is blank.
    pub fn credentials(&self) -> Result<CredentialPair, ApiError> {
        let access = Credential::new(self.access_token.as_str())
            .ok_or_else(|| ApiError::decode("blank access token"))?;
        let refresh = Credential::new(self.refresh_token.as_str())
            .ok_or_else(|| ApiError::decode("blank refresh token"))?;

        Ok(CredentialPair::new(access, refresh)
            .with_token_type(self.token_type.clone().unwrap_or_default())
            .with_expires_in(self.expires_in.unwrap_or_default()))
    }

    /// Converts a login or register response into a grant.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if a token is blank or the profile is missing.
    pub fn into_grant(self) -> Result<TokenGrant, ApiError> {
        let credentials = self.credentials()?;
        let user = self
            .user
            .ok_or_else(|| ApiError::decode("token response carries no user"))?;
        Ok(TokenGrant::new(credentials, user))
    }
}
