//! Build manifest
//!
//! The project descriptor (`package.json`) found at the root of a cloned
//! workspace. Only the `scripts.build` entry matters to the pipeline.

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

/// File name of the manifest at the workspace root
pub const MANIFEST_FILE: &str = "package.json";

/// Errors raised while parsing a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("manifest must be a JSON object")]
    NotAnObject,
}

/// Parsed project descriptor
#[derive(Debug, Clone, Default)]
pub struct BuildManifest {
    scripts: Option<HashMap<String, JsonValue>>,
}

impl BuildManifest {
    /// Parses manifest contents
    pub fn parse(contents: &str) -> Result<Self, ManifestError> {
        let value: JsonValue = serde_json::from_str(contents)?;
        if !value.is_object() {
            return Err(ManifestError::NotAnObject);
        }

        // Non-object `scripts` values are treated as "no scripts"
        let scripts = value
            .get("scripts")
            .and_then(JsonValue::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<HashMap<_, _>>()
            });

        Ok(Self { scripts })
    }

    /// Returns the declared build command, if any
    ///
    /// Only a non-empty string counts as a build command.
    pub fn build_command(&self) -> Option<&str> {
        self.scripts
            .as_ref()?
            .get("build")?
            .as_str()
            .filter(|cmd| !cmd.trim().is_empty())
    }
}
