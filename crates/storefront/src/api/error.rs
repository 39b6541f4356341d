//! Error types for the Koshimart API adapter.

use koshimart_core::{EmailError, IdError, IdentifierError};
use serde::Deserialize;
use thiserror::Error;

/// Maximum number of body characters kept in an error message.
const MAX_MESSAGE_CHARS: usize = 200;

/// Every way a call through the adapter can fail.
///
/// Transport and server failures are normalized into this type and logged
/// once by [`ApiClient`](super::ApiClient); callers decide how to degrade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never reached the server (DNS, connect, TLS, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The response body could not be parsed.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request was not issued because an input was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Error body shapes produced by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    /// Build an `Http` error from a failed response, extracting the most
    /// useful message from the body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail.or(b.message).or(b.error))
            .unwrap_or_else(|| body.chars().take(MAX_MESSAGE_CHARS).collect());

        Self::Http { status, message }
    }

    /// HTTP status, when the server responded.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the server rejected the credentials (401).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }

    /// Returns `true` for 4xx responses.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Http { status, .. } if *status >= 400 && *status < 500)
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<IdentifierError> for ApiError {
    fn from(err: IdentifierError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
