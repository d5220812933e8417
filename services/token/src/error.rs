//! Access token error type.

use crate::model::{AccessTokenErr, AccessTokenErrorCode};
use thiserror::Error;

/// Errors produced while handling an access token request.
///
/// Every variant maps onto one of the OAuth2 error codes. Only the
/// validation message of `InvalidRequest` and the fixed messages of
/// `InvalidClient` and `InvalidScope` ever reach the caller.
#[derive(Error, Debug)]
pub enum TokenError {
    /// The request is malformed or structurally incomplete.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The consumer is unknown or not allowed to request tokens.
    #[error("Invalid client: {0}")]
    InvalidClient(String),

    /// The scope or the target producer is not acceptable.
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// The claims could not be signed.
    #[error("JWT signing error: {0}")]
    Signing(String),
}

impl TokenError {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an invalid client error.
    #[must_use]
    pub fn invalid_client(msg: impl Into<String>) -> Self {
        Self::InvalidClient(msg.into())
    }

    /// Create an invalid scope error.
    #[must_use]
    pub fn invalid_scope(msg: impl Into<String>) -> Self {
        Self::InvalidScope(msg.into())
    }

    /// Create a signing error.
    #[must_use]
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// OAuth2 error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> AccessTokenErrorCode {
        match self {
            Self::InvalidRequest(_) | Self::Signing(_) => AccessTokenErrorCode::InvalidRequest,
            Self::InvalidClient(_) => AccessTokenErrorCode::InvalidClient,
            Self::InvalidScope(_) => AccessTokenErrorCode::InvalidScope,
        }
    }

    /// True for failures on our side rather than the caller's.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Signing(_))
    }

    /// Build the error body returned to the consumer.
    ///
    /// Internal failures are reported without a description.
    #[must_use]
    pub fn to_response(&self) -> AccessTokenErr {
        let error_description = match self {
            Self::InvalidRequest(msg) | Self::InvalidClient(msg) | Self::InvalidScope(msg) => {
                Some(msg.clone())
            }
            Self::Signing(_) => None,
        };

        AccessTokenErr {
            error: self.error_code(),
            error_description,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Signing(err.to_string())
    }
}
