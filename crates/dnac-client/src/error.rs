//! Error types for the client.

use thiserror::Error;

use dnac_core::CoreError;

/// Failures below the API layer: the request never produced a usable
/// response.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection, TLS or I/O failure.
    #[error("network error: {0}")]
    Network(String),

    /// The per-request timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// The controller answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request could not be built (bad header, bad base URL, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// HTTP status code, if the controller answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Errors returned by single-shot client calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Caller supplied a malformed id or request. No request was sent.
    #[error("validation error: {0}")]
    Validation(#[from] CoreError),

    /// Network or HTTP failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}
