//! Artifact Fetcher: download of a file referenced by a completed task.

use std::borrow::Cow;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use dnac_core::FileId;

use crate::error::ClientError;
use crate::transport::{ApiRequest, Transport};

/// Base path of the file API.
pub const FILE_PATH: &str = "/dna/intent/api/v1/file";

/// A downloaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_id: FileId,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// True for `text/*` and JSON content.
    pub fn is_text(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.starts_with("text/") || ct.contains("json")
        })
    }

    /// Body as UTF-8, replacing invalid sequences.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Decode the body as JSON. Command runner output is a JSON document.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Downloads files. One request per call; no retry, no cache.
#[derive(Clone)]
pub struct ArtifactFetcher {
    transport: Arc<dyn Transport>,
}

impl ArtifactFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `GET /dna/intent/api/v1/file/{id}`.
    pub async fn fetch(&self, file_id: &FileId) -> Result<Artifact, ClientError> {
        file_id.validate()?;

        let request = ApiRequest::get(format!("{}/{}", FILE_PATH, file_id));
        let response = self.transport.send(request).await?.error_for_status()?;

        let content_type = response.content_type().map(str::to_string);
        debug!(
            file_id = %file_id,
            bytes = response.body.len(),
            content_type = content_type.as_deref().unwrap_or(""),
            "Downloaded file"
        );

        Ok(Artifact {
            file_id: file_id.clone(),
            content_type,
            bytes: response.body,
        })
    }
}
