//! The uppercase round-trip handler.
//!
//! Given a matched event, downloads every referenced file into a scratch
//! directory, uppercases the text contents into a second scratch
//! directory, and uploads the transformed files under a new transaction
//! tagged `uppercase_text = "true"` so its own notification never
//! re-matches. Both scratch directories are removed on every exit path,
//! including failures, because [`tempfile::TempDir`] deletes on drop.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dispatchd_core::types::DbId;
use dispatchd_events::event::{FileRef, IngestEvent, KeyValue};
use dispatchd_events::router::{EventHandler, HandlerError};
use dispatchd_platform::transfer::{FileTransfer, UploadFile};

/// Predicate the handler is registered under: a transaction key-value
/// record with `uppercase_text = "false"` must be present.
pub const UPPERCASE_PREDICATE: &str = "$.data[?(@.destinationTable == \"TransactionKeyValue\" \
     && @.key == \"uppercase_text\" && @.value == \"false\")]";

/// Handler performing the download → uppercase → upload cycle.
pub struct UppercaseHandler {
    transfer: Arc<dyn FileTransfer>,
}

impl UppercaseHandler {
    pub fn new(transfer: Arc<dyn FileTransfer>) -> Self {
        Self { transfer }
    }
}

/// Relative path a file occupies within a transaction.
///
/// `subdir` and `name` arrive in the unauthenticated envelope, so anything
/// that would resolve outside the scratch directories (an absolute path,
/// `..`, a separator inside the file name) fails the task instead of being
/// joined.
fn relative_path(file: &FileRef) -> Result<PathBuf, HandlerError> {
    let name = Path::new(&file.name);
    let mut components = name.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => return Err(format!("unsafe file name {:?}", file.name).into()),
    }

    let mut rel = PathBuf::new();
    if let Some(subdir) = &file.subdir {
        for component in Path::new(subdir).components() {
            match component {
                Component::Normal(part) => rel.push(part),
                _ => return Err(format!("unsafe file subdir {subdir:?}").into()),
            }
        }
    }
    rel.push(name);
    Ok(rel)
}

#[async_trait]
impl EventHandler for UppercaseHandler {
    fn name(&self) -> &str {
        "uppercase"
    }

    async fn handle(&self, event: &IngestEvent) -> Result<Option<DbId>, HandlerError> {
        if event.files.is_empty() {
            tracing::debug!(
                event_id = event.event_id.as_deref().unwrap_or("<none>"),
                "Event references no files, nothing to transform"
            );
            return Ok(None);
        }

        // Scratch directories; removed on drop whatever happens below.
        let downloads = tempfile::tempdir()?;
        let uploads = tempfile::tempdir()?;

        let mut staged = Vec::with_capacity(event.files.len());
        for file in &event.files {
            let rel = relative_path(file)?;
            let src = downloads.path().join(&rel);
            self.transfer.download(file, &src).await?;

            let content = tokio::fs::read_to_string(&src).await?;

            let dest = uploads.path().join(&rel);
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&dest, content.to_uppercase()).await?;

            staged.push(UploadFile {
                path: dest,
                name: file.name.clone(),
                subdir: file.subdir.clone(),
            });
        }

        let key_values = output_key_values(event);
        let job_id = self.transfer.upload(&staged, &key_values).await?;

        tracing::info!(
            event_id = event.event_id.as_deref().unwrap_or("<none>"),
            job_id,
            files = staged.len(),
            "Uppercase round-trip complete"
        );
        Ok(Some(job_id))
    }
}

/// Key-values for the new transaction: the originating context plus the
/// suppression flag.
fn output_key_values(event: &IngestEvent) -> Vec<KeyValue> {
    let mut kvs = Vec::new();
    if let Some(submitter) = event.submitter {
        kvs.push(KeyValue::new("submitter", submitter.to_string()));
    }
    if let Some(instrument) = event.instrument {
        kvs.push(KeyValue::new("instrument", instrument.to_string()));
    }
    if let Some(project) = &event.project {
        kvs.push(KeyValue::new("project", project.clone()));
    }
    kvs.push(KeyValue::new("uppercase_text", "true"));
    kvs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
