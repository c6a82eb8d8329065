//! DNA Center task tracking domain types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Runtime specifics
//!
//! It models the controller's view of an asynchronous task, how a snapshot
//! is classified, and how the overloaded `progress` field is interpreted.

pub mod error;
pub mod ids;
pub mod progress;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::{CoreError, PayloadError};
pub use ids::{validate_path_segment, FileId, TaskId};
pub use progress::{ProgressPayload, FILE_ID_KEY};
pub use status::TaskLifecycle;
pub use task::{TaskListResponse, TaskRecord, TaskRef, TaskRefResponse, TaskResponse};
