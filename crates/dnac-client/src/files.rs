//! File API wrappers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dnac_core::{validate_path_segment, FileId};

use crate::artifact::{Artifact, ArtifactFetcher, FILE_PATH};
use crate::error::ClientError;
use crate::transport::{ApiRequest, Transport};

/// Metadata of a stored file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    pub id: String,
    pub name: String,
    pub name_space: String,
    pub file_format: String,
    /// Reported as a string by the controller.
    pub file_size: String,
    pub download_path: String,
    pub encrypted: bool,
    pub md5_checksum: String,
    pub sha1_checksum: String,
    pub attribute_info: String,
    pub sftp_server_list: Vec<String>,
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default)]
    response: Vec<T>,
}

/// Client for the file endpoints.
#[derive(Clone)]
pub struct FileService {
    transport: Arc<dyn Transport>,
    fetcher: ArtifactFetcher,
}

impl FileService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            fetcher: ArtifactFetcher::new(transport.clone()),
            transport,
        }
    }

    pub async fn download(&self, file_id: &FileId) -> Result<Artifact, ClientError> {
        self.fetcher.fetch(file_id).await
    }

    pub async fn list_namespaces(&self) -> Result<Vec<String>, ClientError> {
        let request = ApiRequest::get(format!("{}/namespace", FILE_PATH));
        let response = self.transport.send(request).await?.error_for_status()?;
        let list: ListResponse<String> = response.json()?;
        Ok(list.response)
    }

    pub async fn list_files(&self, namespace: &str) -> Result<Vec<FileInfo>, ClientError> {
        validate_path_segment("namespace", namespace)?;
        let request = ApiRequest::get(format!("{}/namespace/{}", FILE_PATH, namespace));
        let response = self.transport.send(request).await?.error_for_status()?;
        let list: ListResponse<FileInfo> = response.json()?;
        Ok(list.response)
    }
}
