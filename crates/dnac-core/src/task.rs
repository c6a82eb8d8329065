//! Task snapshots as returned by the controller's task API.

use serde::{Deserialize, Deserializer, Serialize};

use crate::progress::ProgressPayload;
use crate::{TaskId, TaskLifecycle};

/// One snapshot of a remote asynchronous operation.
///
/// Every field defaults when absent: the controller omits whatever is unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskRecord {
    /// Task identifier. Empty if the controller left it out.
    pub id: String,

    /// Free-form progress text or JSON completion payload.
    pub progress: Option<String>,

    /// Whether the controller considers the task failed. `null` reads as false.
    #[serde(deserialize_with = "de_null_bool")]
    pub is_error: bool,

    pub failure_reason: Option<String>,
    pub error_code: Option<String>,
    pub error_key: Option<String>,

    /// Operation-specific data attached by the controller.
    pub data: Option<String>,

    pub service_type: Option<String>,
    pub username: Option<String>,

    /// Epoch milliseconds.
    #[serde(deserialize_with = "de_millis")]
    pub start_time: Option<i64>,
    /// Epoch milliseconds.
    #[serde(deserialize_with = "de_millis")]
    pub end_time: Option<i64>,
    /// Epoch milliseconds.
    #[serde(deserialize_with = "de_millis")]
    pub last_update: Option<i64>,

    pub parent_id: Option<String>,
    pub root_id: Option<String>,

    pub operation_id_list: Option<serde_json::Value>,

    #[serde(rename = "additionalStatusURL")]
    pub additional_status_url: Option<String>,

    pub instance_tenant_id: Option<String>,

    pub version: Option<i64>,
}

impl TaskRecord {
    /// Create a snapshot with the given id and progress (useful for testing).
    pub fn new(id: impl Into<String>, progress: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            progress: Some(progress.into()),
            ..Default::default()
        }
    }

    /// Builder method to flag the snapshot as failed.
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.is_error = true;
        self.failure_reason = Some(reason.into());
        self
    }

    /// Builder method to set the error code.
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn task_id(&self) -> Option<TaskId> {
        if self.id.is_empty() {
            None
        } else {
            Some(TaskId::new(self.id.clone()))
        }
    }

    /// Failure reason, ignoring empty strings.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Error code, ignoring empty strings.
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Parse the progress field.
    pub fn payload(&self) -> ProgressPayload {
        ProgressPayload::parse(self.progress.as_deref().unwrap_or_default())
    }

    /// Classify this snapshot. `completion_key` names the payload field that
    /// marks the task as done once it holds a usable id (`fileId` for the
    /// command runner).
    pub fn lifecycle(&self, completion_key: &str) -> TaskLifecycle {
        if self.is_error || self.failure_reason().is_some() {
            return TaskLifecycle::Failed;
        }

        if self.payload().has_id(completion_key) {
            return TaskLifecycle::Succeeded;
        }

        if self.id.is_empty() && self.progress.is_none() {
            return TaskLifecycle::Unknown;
        }

        TaskLifecycle::Pending
    }
}

/// `{"response": {...task...}, "version": "1.0"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResponse {
    pub response: TaskRecord,
    #[serde(default)]
    pub version: Option<String>,
}

/// `{"response": [...tasks...], "version": "1.0"}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListResponse {
    #[serde(default)]
    pub response: Vec<TaskRecord>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Handle returned by endpoints that start an asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub task_id: TaskId,
    #[serde(default)]
    pub url: String,
}

/// `{"response": {"taskId": "...", "url": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRefResponse {
    pub response: TaskRef,
    #[serde(default)]
    pub version: Option<String>,
}

fn de_null_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// The controller reports timestamps as numbers or numeric strings.
fn de_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Millis>::deserialize(deserializer)? {
        Some(Millis::Int(v)) => Some(v),
        Some(Millis::Float(v)) => Some(v as i64),
        Some(Millis::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = crate::progress::FILE_ID_KEY;

    #[test]
    fn test_decode_full_response() {
        let json = r#"{
            "response": {
                "id": "t-1",
                "progress": "{\"fileId\":\"abc123\"}",
                "isError": false,
                "startTime": 1700000000000,
                "endTime": "1700000005000",
                "serviceType": "Command Runner Service",
                "version": 1700000005000,
                "rootId": "t-1"
            },
            "version": "1.0"
        }"#;
        let resp: TaskResponse = serde_json::from_str(json).unwrap();
        let task = resp.response;

        assert_eq!(task.id, "t-1");
        assert_eq!(task.start_time, Some(1_700_000_000_000));
        assert_eq!(task.end_time, Some(1_700_000_005_000));
        assert_eq!(task.root_id.as_deref(), Some("t-1"));
        assert_eq!(task.lifecycle(KEY), TaskLifecycle::Succeeded);
        assert_eq!(task.payload().file_id().unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_missing_fields_default() {
        let resp: TaskResponse = serde_json::from_str(r#"{"response": {"id": "t-2"}}"#).unwrap();
        assert!(!resp.response.is_error);
        assert!(resp.response.progress.is_none());
        assert_eq!(resp.response.lifecycle(KEY), TaskLifecycle::Pending);
    }

    #[test]
    fn test_error_flag_wins_over_progress() {
        let task = TaskRecord::new("t-3", r#"{"fileId":"abc"}"#).with_failure("device unreachable");
        assert_eq!(task.lifecycle(KEY), TaskLifecycle::Failed);
        assert_eq!(task.failure_reason(), Some("device unreachable"));
    }

    #[test]
    fn test_failure_reason_without_flag_is_failed() {
        let mut task = TaskRecord::new("t-4", "working");
        task.failure_reason = Some("timed out on device".to_string());
        assert_eq!(task.lifecycle(KEY), TaskLifecycle::Failed);

        task.failure_reason = Some("".to_string());
        assert_eq!(task.lifecycle(KEY), TaskLifecycle::Pending);
    }

    #[test]
    fn test_progress_states() {
        assert_eq!(TaskRecord::new("t", "").lifecycle(KEY), TaskLifecycle::Pending);
        assert_eq!(
            TaskRecord::new("t", "Command Runner Gathering Data").lifecycle(KEY),
            TaskLifecycle::Pending
        );
        assert_eq!(
            TaskRecord::new("t", r#"{"other":"x"}"#).lifecycle(KEY),
            TaskLifecycle::Pending
        );
    }

    #[test]
    fn test_null_error_flag_reads_as_false() {
        let resp: TaskResponse =
            serde_json::from_str(r#"{"response": {"id": "t-5", "isError": null}}"#).unwrap();
        assert!(!resp.response.is_error);
        assert_eq!(resp.response.lifecycle(KEY), TaskLifecycle::Pending);
    }

    #[test]
    fn test_unusable_completion_value_stays_pending() {
        for progress in [r#"{"fileId":null}"#, r#"{"fileId":17}"#, r#"{"fileId":""}"#] {
            let task = TaskRecord::new("t-6", progress);
            assert_eq!(task.lifecycle(KEY), TaskLifecycle::Pending, "{progress}");
        }
    }

    #[test]
    fn test_blank_snapshot_is_unknown() {
        let task = TaskRecord::default();
        assert_eq!(task.lifecycle(KEY), TaskLifecycle::Unknown);
        assert!(!task.lifecycle(KEY).is_terminal());
        assert!(task.task_id().is_none());
    }

    #[test]
    fn test_task_ref_decode() {
        let json = r#"{"response": {"taskId": "t-9", "url": "/api/v1/task/t-9"}, "version": "1.0"}"#;
        let resp: TaskRefResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.response.task_id, TaskId::new("t-9"));
        assert_eq!(resp.response.url, "/api/v1/task/t-9");
    }
}
