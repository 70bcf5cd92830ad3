//! Build artifact types
//!
//! Built files are uploaded one object per top-level file of the output
//! directory, under a flat per-project key prefix.

use std::path::PathBuf;

/// Directory the build must produce inside the workspace
pub const OUTPUT_DIR_NAME: &str = "dist";

/// Root of every uploaded object key
pub const OUTPUT_KEY_PREFIX: &str = "__outputs";

/// Content type used when the extension is not recognized
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Returns the key prefix shared by all objects of a project
pub fn key_prefix(project_id: &str) -> String {
    format!("{}/{}", OUTPUT_KEY_PREFIX, project_id)
}

/// Returns the object key of a built file under `prefix`
pub fn object_key(prefix: &str, file_name: &str) -> String {
    format!("{}/{}", prefix, file_name)
}

/// A single file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub local_path: PathBuf,
    pub file_name: String,
    pub object_key: String,
    pub content_type: String,
}

/// Per-file outcome of an upload batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Files uploaded, by name, in upload order
    pub uploaded: Vec<String>,
    /// Files that failed, with the error detail
    pub failed: Vec<(String, String)>,
    /// Top-level entries that were not uploaded (directories)
    pub skipped: Vec<String>,
}

impl UploadReport {
    /// Number of files attempted
    pub fn attempted(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }
}
