//! Core domain errors.

use thiserror::Error;

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Identifier is empty or cannot be used as a path segment.
    #[error("Invalid {kind} id: {value:?}")]
    InvalidId { kind: &'static str, value: String },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors extracting a named field from a progress payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// The payload is structured but does not carry the key.
    #[error("progress payload has no '{0}' field")]
    MissingField(String),

    /// The payload is empty or free text.
    #[error("progress payload is not structured")]
    NotStructured,

    /// The key is present with a value of another type.
    #[error("progress field '{key}' is not a {expected}")]
    WrongType { key: String, expected: &'static str },

    /// The key holds a string that cannot be used as an id.
    #[error("progress field '{key}' is not a usable id: {value:?}")]
    InvalidId { key: String, value: String },
}
