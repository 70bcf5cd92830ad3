//! Error types for the builder

use std::path::PathBuf;
use thiserror::Error;

use shipyard_core::domain::artifact::OUTPUT_DIR_NAME;

/// Errors that abort a pipeline run
///
/// Every variant is fail-fast: the run stops at the stage that raised it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Cloning the repository failed
    #[error("Error cloning repository: {0}")]
    Clone(String),

    /// The manifest is missing or unreadable
    #[error("Error reading package.json: {0}")]
    ManifestRead(String),

    /// Dependency install or build failed
    #[error("Build error: {0}")]
    Build(String),

    /// The build did not produce the output directory
    #[error(
        "{} folder not found at {}. Make sure your build script creates a '{}' folder.",
        OUTPUT_DIR_NAME,
        .0.display(),
        OUTPUT_DIR_NAME
    )]
    Locate(PathBuf),
}

/// Failure of a single file upload
///
/// Never aborts the batch.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("object store rejected {key}: {message}")]
    Store { key: String, message: String },
}

/// Failure to deliver a log event to the remote channel
///
/// Logged locally and dropped by the publisher.
#[derive(Debug, Error)]
#[error("failed to publish to {channel}: {message}")]
pub struct PublishError {
    pub channel: String,
    pub message: String,
}
