//! Command runner: read-only CLI commands executed on devices.
//!
//! Submission returns a [`TaskRef`]. The task completes with a `fileId` in its
//! progress payload, which names a JSON document with the command output.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use dnac_core::{CoreError, TaskRef, TaskRefResponse};

use crate::error::ClientError;
use crate::transport::{ApiRequest, Transport};

pub const COMMAND_RUNNER_PATH: &str = "/dna/intent/api/v1/network-device-poller/cli";

/// Body of a read request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRunnerRequest {
    pub commands: Vec<String>,
    pub device_uuids: Vec<String>,
    /// Seconds the controller waits for each device. `0` uses its default.
    #[serde(default)]
    pub timeout: u64,
}

impl CommandRunnerRequest {
    pub fn new<C, D>(commands: C, device_uuids: D) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            device_uuids: device_uuids.into_iter().map(Into::into).collect(),
            timeout: 0,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = secs;
        self
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.commands.iter().all(|c| c.trim().is_empty()) {
            return Err(CoreError::InvalidInput("no commands given".into()));
        }
        if self.device_uuids.iter().all(|d| d.trim().is_empty()) {
            return Err(CoreError::InvalidInput("no devices given".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct StringList {
    #[serde(default)]
    response: Vec<String>,
}

/// Client for the command runner endpoints.
#[derive(Clone)]
pub struct CommandRunnerService {
    transport: Arc<dyn Transport>,
}

impl CommandRunnerService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Submit commands. Poll the returned task for the output file.
    pub async fn run_read_only_commands(
        &self,
        request: &CommandRunnerRequest,
    ) -> Result<TaskRef, ClientError> {
        request.validate()?;

        let api_request =
            ApiRequest::post(format!("{}/read-request", COMMAND_RUNNER_PATH)).with_json(request)?;
        let response = self.transport.send(api_request).await?.error_for_status()?;
        let envelope: TaskRefResponse = response.json()?;

        info!(
            task_id = %envelope.response.task_id,
            commands = request.commands.len(),
            devices = request.device_uuids.len(),
            "Submitted read-only commands"
        );
        Ok(envelope.response)
    }

    /// Command keywords the controller accepts for read requests.
    pub async fn legit_reads(&self) -> Result<Vec<String>, ClientError> {
        let request = ApiRequest::get(format!("{}/legit-reads", COMMAND_RUNNER_PATH));
        let response = self.transport.send(request).await?.error_for_status()?;
        let list: StringList = response.json()?;
        Ok(list.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_submit_returns_task_ref() {
        let stub = Arc::new(StubTransport::new().push_json(
            202,
            json!({"response": {"taskId": "t-42", "url": "/api/v1/task/t-42"}, "version": "1.0"}),
        ));
        let service = CommandRunnerService::new(stub.clone());

        let request = CommandRunnerRequest::new(["show version"], ["dev-1", "dev-2"]);
        let task = service.run_read_only_commands(&request).await.unwrap();

        assert_eq!(task.task_id.as_str(), "t-42");
        assert_eq!(task.url, "/api/v1/task/t-42");

        let sent = &stub.requests()[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(
            sent.path,
            "/dna/intent/api/v1/network-device-poller/cli/read-request"
        );
        assert_eq!(
            sent.body,
            Some(json!({
                "commands": ["show version"],
                "deviceUuids": ["dev-1", "dev-2"],
                "timeout": 0
            }))
        );
    }

    #[tokio::test]
    async fn test_empty_request_is_rejected() {
        let stub = Arc::new(StubTransport::new());
        let service = CommandRunnerService::new(stub.clone());

        let no_commands = CommandRunnerRequest::new(Vec::<String>::new(), ["dev-1"]);
        let no_devices = CommandRunnerRequest::new(["show clock"], [" "]);

        assert!(matches!(
            service.run_read_only_commands(&no_commands).await,
            Err(ClientError::Validation(CoreError::InvalidInput(_)))
        ));
        assert!(matches!(
            service.run_read_only_commands(&no_devices).await,
            Err(ClientError::Validation(CoreError::InvalidInput(_)))
        ));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_legit_reads() {
        let stub = Arc::new(StubTransport::new().push_json(
            200,
            json!({"response": ["show", "ping", "traceroute"]}),
        ));
        let service = CommandRunnerService::new(stub.clone());

        let reads = service.legit_reads().await.unwrap();

        assert_eq!(reads, vec!["show", "ping", "traceroute"]);
        assert_eq!(
            stub.paths(),
            vec!["/dna/intent/api/v1/network-device-poller/cli/legit-reads"]
        );
    }
}
