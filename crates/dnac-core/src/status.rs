//! Lifecycle classification of a task snapshot.

use serde::{Deserialize, Serialize};

/// Derived state of a remote task. Never stored by the controller; computed
/// from each fetched [`TaskRecord`](crate::TaskRecord).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskLifecycle {
    /// Still running: no error flag and no completion payload yet.
    #[default]
    Pending,
    /// Progress carries the expected completion marker.
    Succeeded,
    /// The controller flagged the task as failed.
    Failed,
    /// The snapshot is too sparse to classify. Treated as non-terminal.
    Unknown,
}

impl TaskLifecycle {
    /// Returns true if polling should stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for TaskLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
