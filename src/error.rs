//! Error model shared by the EBS client, the platform client and the stores.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type used across the crate.
pub type ClientResult<T> = Result<T, ClientError>;

/// Everything that can go wrong while talking to the EBS or the platform API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No token was available for a request that must be signed.
    #[error("missing token")]
    MissingToken,

    /// The token is not a structurally valid JWT.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The token signature did not match the configured extension secret.
    #[error("invalid token signature: {0}")]
    InvalidSignature(String),

    /// The token is past its `exp` claim.
    #[error("token expired")]
    TokenExpired,

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status code, with the response body for logs.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedToken(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// True for the errors that mean the caller has to obtain a fresh token.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingToken
                | Self::MalformedToken(_)
                | Self::InvalidSignature(_)
                | Self::TokenExpired
                | Self::Unauthorized
        )
    }
}
