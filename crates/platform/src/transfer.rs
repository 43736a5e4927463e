//! File download and transactional upload.
//!
//! [`FileTransfer`] is the seam between handlers and the platform's
//! upload/download services: production code wires in [`HttpTransfer`],
//! tests substitute an in-memory implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use dispatchd_core::types::DbId;
use dispatchd_events::event::{FileRef, KeyValue};
use serde_json::{json, Value};

use crate::config::PlatformConfig;
use crate::policy::PolicyClient;
use crate::PlatformError;

/// HTTP request timeout for a single transfer call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A local file staged for upload, with the name and sub-directory it
/// should occupy inside the new transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
    pub name: String,
    pub subdir: Option<String>,
}

/// Download and upload operations against the platform.
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// Download a referenced file into `dest`.
    async fn download(&self, file: &FileRef, dest: &Path) -> Result<(), PlatformError>;

    /// Upload files under a new transaction annotated with `key_values`.
    ///
    /// Returns the upstream upload job id. Implementations validate the
    /// transaction metadata with the policy service before sending
    /// anything; a rejection uploads nothing.
    async fn upload(
        &self,
        files: &[UploadFile],
        key_values: &[KeyValue],
    ) -> Result<DbId, PlatformError>;
}

/// Production [`FileTransfer`] over HTTP.
pub struct HttpTransfer {
    client: reqwest::Client,
    config: PlatformConfig,
    policy: PolicyClient,
}

impl HttpTransfer {
    /// Create a transfer client with a pre-configured HTTP client.
    pub fn new(config: PlatformConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        let policy = PolicyClient::new(config.clone());
        Self {
            client,
            config,
            policy,
        }
    }
}

#[async_trait]
impl FileTransfer for HttpTransfer {
    async fn download(&self, file: &FileRef, dest: &Path) -> Result<(), PlatformError> {
        let url = format!("{}/files/{}", self.config.download_url, file.id);

        let response = self.config.auth.apply(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(PlatformError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &body).await?;

        tracing::debug!(file_id = file.id, dest = %dest.display(), bytes = body.len(), "Downloaded file");
        Ok(())
    }

    async fn upload(
        &self,
        files: &[UploadFile],
        key_values: &[KeyValue],
    ) -> Result<DbId, PlatformError> {
        let metadata = metadata_records(files, key_values);

        // Policy gate first; a rejection uploads nothing.
        self.policy.validate(&metadata).await?;

        let mut file_payloads = Vec::with_capacity(files.len());
        for file in files {
            let content = tokio::fs::read_to_string(&file.path).await?;
            file_payloads.push(json!({
                "name": file.name,
                "subdir": file.subdir,
                "content": content,
            }));
        }

        let url = format!("{}/upload", self.config.upload_url);
        let body = json!({
            "metadata": metadata,
            "files": file_payloads,
        });

        let response = self
            .config
            .auth
            .apply(self.client.post(&url).json(&body))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PlatformError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let reply: Value = response.json().await?;
        let job_id = reply
            .get("job_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| PlatformError::InvalidResponse {
                url,
                detail: "missing numeric `job_id`".into(),
            })?;

        tracing::info!(job_id, files = files.len(), "Upload accepted");
        Ok(job_id)
    }
}

/// Build the destination-table metadata records describing an upload:
/// one `TransactionKeyValue` record per annotation and one `Files` record
/// per staged file.
pub fn metadata_records(files: &[UploadFile], key_values: &[KeyValue]) -> Vec<Value> {
    let mut records: Vec<Value> = key_values
        .iter()
        .map(|kv| {
            json!({
                "destinationTable": "TransactionKeyValue",
                "key": kv.key,
                "value": kv.value,
            })
        })
        .collect();

    records.extend(files.iter().map(|f| {
        json!({
            "destinationTable": "Files",
            "name": f.name,
            "subdir": f.subdir.as_deref().unwrap_or(""),
        })
    }));

    records
}
