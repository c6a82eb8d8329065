//! Newtype wrappers for identifiers to ensure type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Characters that would change the meaning of a URL path segment.
fn is_forbidden(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%')
}

/// Check that `value` can be interpolated into a URL path as one segment.
pub fn validate_path_segment(kind: &'static str, value: &str) -> Result<(), CoreError> {
    if value.is_empty() || value.chars().any(is_forbidden) {
        return Err(CoreError::InvalidId {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Identifier of a remote asynchronous task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new TaskId from a string without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a caller-supplied id. Rejects empty ids and ids that cannot be
    /// placed in a URL path segment.
    pub fn parse(id: &str) -> Result<Self, CoreError> {
        let id = id.trim();
        validate_path_segment("task", id)?;
        Ok(Self(id.to_string()))
    }

    /// Re-check an id built with [`TaskId::new`].
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_path_segment("task", &self.0)
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a downloadable file held by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Create a new FileId from a string without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a caller-supplied id.
    pub fn parse(id: &str) -> Result<Self, CoreError> {
        let id = id.trim();
        validate_path_segment("file", id)?;
        Ok(Self(id.to_string()))
    }

    /// Re-check an id built with [`FileId::new`].
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_path_segment("file", &self.0)
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
