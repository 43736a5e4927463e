//! In-memory [`FileTransfer`] implementation for handler and runner tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use dispatchd_core::types::DbId;
use dispatchd_events::event::{FileRef, KeyValue};
use dispatchd_platform::transfer::{FileTransfer, UploadFile};
use dispatchd_platform::PlatformError;

/// One file as it arrived at the fake upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub subdir: Option<String>,
    pub content: String,
}

/// One recorded call to [`FileTransfer::upload`].
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub files: Vec<UploadedFile>,
    pub key_values: Vec<KeyValue>,
}

/// Fake transfer backend: downloads serve seeded content, uploads are
/// recorded. Every path written during a download is remembered so tests
/// can assert scratch-directory cleanup.
pub struct MemoryTransfer {
    files: HashMap<DbId, String>,
    uploads: Mutex<Vec<RecordedUpload>>,
    touched: Mutex<Vec<PathBuf>>,
    fail_uploads: bool,
}

impl MemoryTransfer {
    /// Job id returned for every successful upload.
    pub const JOB_ID: DbId = 1001;

    pub fn new<I>(seed: I) -> Self
    where
        I: IntoIterator<Item = (DbId, &'static str)>,
    {
        Self {
            files: seed
                .into_iter()
                .map(|(id, content)| (id, content.to_string()))
                .collect(),
            uploads: Mutex::new(Vec::new()),
            touched: Mutex::new(Vec::new()),
            fail_uploads: false,
        }
    }

    /// Make every upload attempt fail with an HTTP-style error.
    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn touched_paths(&self) -> Vec<PathBuf> {
        self.touched.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileTransfer for MemoryTransfer {
    async fn download(&self, file: &FileRef, dest: &Path) -> Result<(), PlatformError> {
        let content = self
            .files
            .get(&file.id)
            .ok_or_else(|| PlatformError::HttpStatus {
                status: 404,
                url: format!("memory://files/{}", file.id),
            })?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, content).await?;
        self.touched.lock().unwrap().push(dest.to_path_buf());
        Ok(())
    }

    async fn upload(
        &self,
        files: &[UploadFile],
        key_values: &[KeyValue],
    ) -> Result<DbId, PlatformError> {
        if self.fail_uploads {
            return Err(PlatformError::HttpStatus {
                status: 503,
                url: "memory://upload".into(),
            });
        }

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            uploaded.push(UploadedFile {
                name: file.name.clone(),
                subdir: file.subdir.clone(),
                content: tokio::fs::read_to_string(&file.path).await?,
            });
        }

        self.uploads.lock().unwrap().push(RecordedUpload {
            files: uploaded,
            key_values: key_values.to_vec(),
        });
        Ok(Self::JOB_ID)
    }
}
