//! Task Status Reader: one fetch of one task snapshot.

use std::sync::Arc;

use tracing::debug;

use dnac_core::{TaskId, TaskRecord, TaskResponse};

use crate::error::ClientError;
use crate::transport::{ApiRequest, Transport};

/// Base path of the task API.
pub const TASK_PATH: &str = "/dna/intent/api/v1/task";

/// Fetches task snapshots. Never retries; that is the waiter's job.
#[derive(Clone)]
pub struct TaskReader {
    transport: Arc<dyn Transport>,
}

impl TaskReader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `GET /dna/intent/api/v1/task/{id}`.
    pub async fn fetch(&self, task_id: &TaskId) -> Result<TaskRecord, ClientError> {
        task_id.validate()?;

        let request = ApiRequest::get(format!("{}/{}", TASK_PATH, task_id));
        let response = self.transport.send(request).await?.error_for_status()?;

        let envelope: TaskResponse = response.json()?;
        debug!(
            task_id = %task_id,
            is_error = envelope.response.is_error,
            progress = envelope.response.progress.as_deref().unwrap_or(""),
            "Fetched task"
        );
        Ok(envelope.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::testing::StubTransport;
    use crate::transport::ApiResponse;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_decodes_task() {
        let stub = Arc::new(StubTransport::new().push_task(json!({
            "id": "t-1",
            "progress": "Command Runner Gathering Data",
            "isError": false
        })));
        let reader = TaskReader::new(stub.clone());

        let task = reader.fetch(&TaskId::new("t-1")).await.unwrap();

        assert_eq!(task.id, "t-1");
        assert_eq!(task.progress.as_deref(), Some("Command Runner Gathering Data"));
        assert_eq!(stub.paths(), vec!["/dna/intent/api/v1/task/t-1"]);
    }

    #[tokio::test]
    async fn test_empty_id_fails_without_request() {
        let stub = Arc::new(StubTransport::new());
        let reader = TaskReader::new(stub.clone());

        let err = reader.fetch(&TaskId::new("")).await.unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_http_error_is_transport_error() {
        let stub = Arc::new(StubTransport::new().push_json(
            404,
            json!({"response": {"errorCode": "NotFound", "message": "no such task"}}),
        ));
        let reader = TaskReader::new(stub);

        let err = reader.fetch(&TaskId::new("t-2")).await.unwrap_err();

        match err {
            ClientError::Transport(TransportError::Status { status, message }) => {
                assert_eq!(status, 404);
                assert!(message.contains("no such task"));
            }
            other => panic!("Expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_error_is_passed_through() {
        let stub = Arc::new(StubTransport::new().push_error(TransportError::Timeout));
        let reader = TaskReader::new(stub.clone());

        let err = reader.fetch(&TaskId::new("t-3")).await.unwrap_err();

        assert!(matches!(err, ClientError::Transport(TransportError::Timeout)));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let stub = Arc::new(
            StubTransport::new()
                .push(Ok(ApiResponse::new(200, "<html>login</html>"))),
        );
        let reader = TaskReader::new(stub);

        let err = reader.fetch(&TaskId::new("t-4")).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_body_without_envelope_is_decode_error() {
        let stub = Arc::new(StubTransport::new().push_json(200, json!({"id": "t-5"})));
        let reader = TaskReader::new(stub);

        let err = reader.fetch(&TaskId::new("t-5")).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
