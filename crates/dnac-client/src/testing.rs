//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::TransportError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

type Hook = Box<dyn Fn(usize) + Send + Sync>;

/// Replays queued responses in order and records every request. The final
/// queued response is repeated once the queue runs dry.
#[derive(Default)]
pub(crate) struct StubTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: Mutex<Vec<ApiRequest>>,
    on_send: Option<Hook>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(self, response: Result<ApiResponse, TransportError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn push_json(self, status: u16, body: Value) -> Self {
        self.push(Ok(ApiResponse::json_body(status, &body)))
    }

    /// Queue a task snapshot wrapped in the controller's envelope.
    pub(crate) fn push_task(self, task: Value) -> Self {
        self.push_json(200, json!({ "response": task, "version": "1.0" }))
    }

    pub(crate) fn push_error(self, err: TransportError) -> Self {
        self.push(Err(err))
    }

    /// Run `hook(n)` after the n-th request (1-based) has been answered.
    pub(crate) fn on_send(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_send = Some(Box::new(hook));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        let response = {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            }
        };

        if let Some(hook) = &self.on_send {
            hook(call);
        }

        response.unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
    }
}
