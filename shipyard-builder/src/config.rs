//! Builder configuration
//!
//! Everything a run needs is read once from the environment at startup and
//! stays read-only for the lifetime of the process.

use std::path::PathBuf;
use thiserror::Error;

/// Default pub/sub endpoint when `REDIS_URL` is unset
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Default clone destination when `WORKSPACE_DIR` is unset
pub const DEFAULT_WORKSPACE_DIR: &str = "output";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is missing")]
    MissingVar(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Object-store settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,

    /// Static credentials; the default AWS provider chain is used when absent
    pub credentials: Option<StaticCredentials>,

    /// Custom endpoint for S3-compatible stores
    pub endpoint_url: Option<String>,
}

#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Builder configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Project identifier scoping log channels and object keys
    pub project_id: String,

    /// Repository to clone
    pub repository_url: String,

    /// Pub/sub endpoint (e.g., "redis://localhost:6379")
    pub redis_url: String,

    /// Where the repository is cloned and built
    pub workspace_dir: PathBuf,

    pub storage: StorageConfig,

    /// Exit with a non-zero status when the run fails
    pub strict_exit: bool,
}

impl Config {
    /// Builds configuration from a variable source (usually the environment)
    ///
    /// Expected variables:
    /// - PROJECT_ID (required)
    /// - GIT_REPOSITORY_URL (required, GIT_REPOSITORY__URL accepted as fallback)
    /// - S3_BUCKET_NAME, AWS_REGION (required)
    /// - AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY (optional, used together)
    /// - AWS_ENDPOINT_URL (optional)
    /// - REDIS_URL (optional, default: redis://localhost:6379)
    /// - WORKSPACE_DIR (optional, default: output)
    /// - SHIPYARD_STRICT_EXIT (optional, default: false)
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let project_id = var("PROJECT_ID").ok_or(ConfigError::MissingVar("PROJECT_ID"))?;

        let repository_url = var("GIT_REPOSITORY_URL")
            .or_else(|| var("GIT_REPOSITORY__URL"))
            .ok_or(ConfigError::MissingVar("GIT_REPOSITORY_URL"))?;

        let bucket = var("S3_BUCKET_NAME").ok_or(ConfigError::MissingVar("S3_BUCKET_NAME"))?;
        let region = var("AWS_REGION").ok_or(ConfigError::MissingVar("AWS_REGION"))?;

        let credentials = match (var("AWS_ACCESS_KEY_ID"), var("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together".to_string(),
                ));
            }
        };

        let redis_url = var("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

        let workspace_dir = var("WORKSPACE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE_DIR));

        let strict_exit = var("SHIPYARD_STRICT_EXIT")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Ok(Self {
            project_id,
            repository_url,
            redis_url,
            workspace_dir,
            storage: StorageConfig {
                bucket,
                region,
                credentials,
                endpoint_url: var("AWS_ENDPOINT_URL"),
            },
            strict_exit,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.contains(char::is_whitespace) || self.project_id.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "PROJECT_ID '{}' must not contain whitespace or '/'",
                self.project_id
            )));
        }

        if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://") {
            return Err(ConfigError::Invalid(
                "REDIS_URL must start with redis:// or rediss://".to_string(),
            ));
        }

        if self.repository_url.starts_with('-') {
            return Err(ConfigError::Invalid(
                "GIT_REPOSITORY_URL must not start with '-'".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parses a boolean flag value ("1", "true", "yes")
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
