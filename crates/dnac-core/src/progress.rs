//! Interpretation of a task's free-form `progress` field.
//!
//! The controller uses the same string for human-readable narration
//! ("Command Runner Gathering Data") and for completion payloads
//! (`{"fileId":"..."}`). Parsing never fails: anything that is not a JSON
//! object is kept verbatim as raw text.

use serde_json::{Map, Value};

use crate::error::PayloadError;
use crate::ids::{validate_path_segment, FileId};

/// Key under which the command runner publishes its output file.
pub const FILE_ID_KEY: &str = "fileId";

/// Parsed form of a task's progress string.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressPayload {
    /// No progress reported yet.
    Empty,
    /// Free text, or JSON that is not an object.
    Raw(String),
    /// A JSON object.
    Structured(Map<String, Value>),
}

impl ProgressPayload {
    pub fn parse(progress: &str) -> Self {
        if progress.trim().is_empty() {
            return Self::Empty;
        }

        match serde_json::from_str::<Value>(progress) {
            Ok(Value::Object(map)) => Self::Structured(map),
            _ => Self::Raw(progress.to_string()),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// True if the payload is structured and carries `key`.
    pub fn contains(&self, key: &str) -> bool {
        match self {
            Self::Structured(map) => map.contains_key(key),
            _ => false,
        }
    }

    /// Look up a field of a structured payload.
    pub fn get(&self, key: &str) -> Result<&Value, PayloadError> {
        match self {
            Self::Structured(map) => map
                .get(key)
                .ok_or_else(|| PayloadError::MissingField(key.to_string())),
            Self::Empty | Self::Raw(_) => Err(PayloadError::NotStructured),
        }
    }

    /// Look up a string field of a structured payload.
    pub fn get_str(&self, key: &str) -> Result<&str, PayloadError> {
        self.get(key)?.as_str().ok_or_else(|| PayloadError::WrongType {
            key: key.to_string(),
            expected: "string",
        })
    }

    /// Look up an id published under `key`. Null, non-string, empty and
    /// non path-safe values are all rejected.
    pub fn get_id(&self, key: &str) -> Result<FileId, PayloadError> {
        let value = self.get_str(key)?;
        validate_path_segment("file", value).map_err(|_| PayloadError::InvalidId {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        Ok(FileId::new(value))
    }

    /// True if `key` carries a usable id.
    pub fn has_id(&self, key: &str) -> bool {
        self.get_id(key).is_ok()
    }

    /// The command runner's output file, published as `fileId`.
    pub fn file_id(&self) -> Result<FileId, PayloadError> {
        self.get_id(FILE_ID_KEY)
    }

    /// Human-readable text, if this is a raw payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Raw(text) => Some(text),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProgressPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "<empty>"),
            Self::Raw(text) => write!(f, "{}", text),
            Self::Structured(map) => write!(f, "{}", Value::Object(map.clone())),
        }
    }
}
