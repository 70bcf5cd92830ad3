//! Artifact locator
//!
//! The build must leave its output in `dist/` at the workspace root. A build
//! that succeeds without producing it is a failed run.

use shipyard_core::domain::artifact::OUTPUT_DIR_NAME;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::PipelineError;

/// Returns the output directory of a finished build
pub async fn locate(workspace: &Path) -> Result<PathBuf, PipelineError> {
    let output_dir = workspace.join(OUTPUT_DIR_NAME);

    match tokio::fs::metadata(&output_dir).await {
        Ok(metadata) if metadata.is_dir() => {
            debug!("Found build output at {}", output_dir.display());
            Ok(output_dir)
        }
        _ => Err(PipelineError::Locate(output_dir)),
    }
}
