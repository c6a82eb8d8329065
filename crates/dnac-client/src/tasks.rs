//! Task API wrappers beyond the single-task read.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use dnac_core::{validate_path_segment, TaskId, TaskListResponse, TaskRecord};

use crate::error::ClientError;
use crate::reader::{TaskReader, TASK_PATH};
use crate::transport::{ApiRequest, Transport};

/// Filters for task listing and counting. Unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    /// Epoch millis lower bound.
    pub start_time: Option<i64>,
    /// Epoch millis upper bound.
    pub end_time: Option<i64>,
    pub data: Option<String>,
    pub error_code: Option<String>,
    pub service_type: Option<String>,
    pub username: Option<String>,
    pub progress: Option<String>,
    pub is_error: Option<bool>,
    pub failure_reason: Option<String>,
    pub parent_id: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    /// `asc` or `des`.
    pub order: Option<String>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_is_error(mut self, is_error: bool) -> Self {
        self.is_error = Some(is_error);
        self
    }
}

#[derive(Debug, Deserialize)]
struct CountResult {
    response: u64,
}

/// Client for the task endpoints.
#[derive(Clone)]
pub struct TaskService {
    transport: Arc<dyn Transport>,
    reader: TaskReader,
}

impl TaskService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            reader: TaskReader::new(transport.clone()),
            transport,
        }
    }

    /// The underlying single-task reader.
    pub fn reader(&self) -> &TaskReader {
        &self.reader
    }

    pub async fn get_task_by_id(&self, task_id: &TaskId) -> Result<TaskRecord, ClientError> {
        self.reader.fetch(task_id).await
    }

    /// The task and all of its descendants.
    pub async fn get_task_tree(&self, task_id: &TaskId) -> Result<Vec<TaskRecord>, ClientError> {
        task_id.validate()?;
        let request = ApiRequest::get(format!("{}/{}/tree", TASK_PATH, task_id));
        self.list(request).await
    }

    pub async fn get_tasks_by_operation_id(
        &self,
        operation_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<TaskRecord>, ClientError> {
        validate_path_segment("operation", operation_id)?;
        let request = ApiRequest::get(format!(
            "{}/operation/{}/{}/{}",
            TASK_PATH, operation_id, offset, limit
        ));
        self.list(request).await
    }

    pub async fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>, ClientError> {
        let request = ApiRequest::get(TASK_PATH).with_query(query)?;
        self.list(request).await
    }

    /// Number of tasks matching the filters. Paging fields are ignored.
    pub async fn get_task_count(&self, query: &TaskQuery) -> Result<u64, ClientError> {
        let filters = TaskQuery {
            offset: None,
            limit: None,
            sort_by: None,
            order: None,
            ..query.clone()
        };
        let request = ApiRequest::get(format!("{}/count", TASK_PATH)).with_query(&filters)?;
        let response = self.transport.send(request).await?.error_for_status()?;
        let count: CountResult = response.json()?;
        Ok(count.response)
    }

    async fn list(&self, request: ApiRequest) -> Result<Vec<TaskRecord>, ClientError> {
        let path = request.path.clone();
        let response = self.transport.send(request).await?.error_for_status()?;
        let list: TaskListResponse = response.json()?;
        debug!(path = %path, count = list.response.len(), "Listed tasks");
        Ok(list.response)
    }
}
