//! Artifact uploader service
//!
//! Uploads the top-level files of the build output directory, one object
//! per file, one file at a time. Subdirectories are skipped, not recursed.
//!
//! Uploading is best-effort: a failed file is logged and the batch moves on.

use shipyard_core::domain::artifact::{
    DEFAULT_CONTENT_TYPE, UploadReport, UploadTask, object_key,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::repository::ObjectStore;
use crate::service::LogPublisher;

pub struct ArtifactUploader {
    store: Arc<dyn ObjectStore>,
}

impl ArtifactUploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Uploads every top-level file of `output_dir` under `key_prefix`
    ///
    /// Always completes; per-file outcomes are published and collected in the
    /// returned report.
    pub async fn upload(
        &self,
        output_dir: &Path,
        bucket: &str,
        key_prefix: &str,
        publisher: &LogPublisher,
    ) -> UploadReport {
        let mut report = UploadReport::default();

        let tasks = match plan_uploads(output_dir, key_prefix, &mut report.skipped).await {
            Ok(tasks) => tasks,
            Err(e) => {
                publisher.publish_error(format!(
                    "Error reading output directory {}: {}",
                    output_dir.display(),
                    e
                ));
                return report;
            }
        };

        for name in &report.skipped {
            debug!("Skipping directory {}", name);
        }

        for task in &tasks {
            publisher.publish(format!("Uploading {}", task.file_name));

            match self
                .store
                .put_object(bucket, &task.object_key, &task.local_path, &task.content_type)
                .await
            {
                Ok(()) => {
                    publisher.publish(format!("Uploaded {}", task.file_name));
                    report.uploaded.push(task.file_name.clone());
                }
                Err(e) => {
                    publisher.publish_error(format!("Error uploading {}: {}", task.file_name, e));
                    report.failed.push((task.file_name.clone(), e.to_string()));
                }
            }
        }

        publisher.publish(format!(
            "Uploaded {} of {} file(s)",
            report.uploaded.len(),
            report.attempted()
        ));

        report
    }
}

/// Lists the upload tasks for the top-level files of `output_dir`
///
/// Directory names are pushed onto `skipped`. Order follows the directory
/// enumeration.
async fn plan_uploads(
    output_dir: &Path,
    key_prefix: &str,
    skipped: &mut Vec<String>,
) -> std::io::Result<Vec<UploadTask>> {
    let mut entries = tokio::fs::read_dir(output_dir).await?;
    let mut tasks = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().to_string();

        // Entries that cannot be inspected are still attempted
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => {
                skipped.push(file_name);
                continue;
            }
            Ok(_) => {}
            Err(e) => warn!("Cannot stat {}: {}", path.display(), e),
        }

        tasks.push(UploadTask {
            object_key: object_key(key_prefix, &file_name),
            content_type: content_type_for(&path),
            file_name,
            local_path: path,
        });
    }

    Ok(tasks)
}

/// Infers the content type from the file extension
fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}
