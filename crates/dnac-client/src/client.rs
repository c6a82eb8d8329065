//! Combined client over one shared transport.

use std::sync::Arc;

use tracing::info;

use crate::artifact::ArtifactFetcher;
use crate::command_runner::CommandRunnerService;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::files::FileService;
use crate::http::HttpTransport;
use crate::reader::TaskReader;
use crate::tasks::TaskService;
use crate::transport::Transport;
use crate::waiter::{CompletionWaiter, WaitPolicy};

/// Combined client with access to all services.
#[derive(Clone)]
pub struct Client {
    /// Task service client.
    pub tasks: TaskService,
    /// File service client.
    pub files: FileService,
    /// Command runner client.
    pub command_runner: CommandRunnerService,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Build an HTTP-backed client.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        info!(
            base_url = %config.base_url,
            insecure = config.accept_invalid_certs,
            "Creating controller client"
        );
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Build a client over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            tasks: TaskService::new(transport.clone()),
            files: FileService::new(transport.clone()),
            command_runner: CommandRunnerService::new(transport.clone()),
            transport,
        }
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    pub fn reader(&self) -> TaskReader {
        self.tasks.reader().clone()
    }

    pub fn artifacts(&self) -> ArtifactFetcher {
        ArtifactFetcher::new(self.transport.clone())
    }

    /// A poll loop sharing this client's transport.
    pub fn waiter(&self, policy: WaitPolicy) -> CompletionWaiter {
        CompletionWaiter::new(self.reader(), policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;
    use crate::CommandRunnerRequest;
    use serde_json::{json, Value};
    use std::time::Duration;

    #[tokio::test]
    async fn test_submit_wait_download() {
        let stub = Arc::new(
            StubTransport::new()
                .push_json(202, json!({"response": {"taskId": "t-7", "url": "/api/v1/task/t-7"}}))
                .push_task(json!({"id": "t-7", "progress": "Command Runner Gathering Data"}))
                .push_task(json!({"id": "t-7", "progress": "{\"fileId\":\"f-7\"}"}))
                .push_json(200, json!([{"deviceUuid": "dev-1", "commandResponses": {"SUCCESS": {}}}])),
        );
        let client = Client::with_transport(stub.clone());

        let task = client
            .command_runner
            .run_read_only_commands(&CommandRunnerRequest::new(["show version"], ["dev-1"]))
            .await
            .unwrap();
        let completion = client
            .waiter(WaitPolicy::fixed(5, Duration::ZERO))
            .wait_for_completion(&task.task_id)
            .await
            .unwrap();
        let artifact = client
            .artifacts()
            .fetch(&completion.file_id().unwrap())
            .await
            .unwrap();

        let output: Value = artifact.json().unwrap();
        assert_eq!(output[0]["deviceUuid"], "dev-1");
        assert_eq!(
            stub.paths(),
            vec![
                "/dna/intent/api/v1/network-device-poller/cli/read-request",
                "/dna/intent/api/v1/task/t-7",
                "/dna/intent/api/v1/task/t-7",
                "/dna/intent/api/v1/file/f-7",
            ]
        );
    }

    #[test]
    fn test_new_with_http_transport() {
        let client = Client::new(&ClientConfig::new("https://10.0.0.1"));
        assert!(client.is_ok());
    }
}
