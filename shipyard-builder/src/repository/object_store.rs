//! Object store repository
//!
//! Uploads built files to S3 (or an S3-compatible store).

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::UploadError;

/// Repository trait for object uploads
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a local file as one object
    ///
    /// # Arguments
    /// * `bucket` - Destination bucket
    /// * `key` - Object key (e.g., "__outputs/site-42/index.html")
    /// * `path` - Local file to read
    /// * `content_type` - MIME type stored with the object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), UploadError>;
}

/// S3 implementation of ObjectStore
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    /// Builds an S3 client from storage settings
    ///
    /// Static credentials are used when configured, otherwise the default
    /// AWS provider chain resolves them.
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let Some(creds) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                None,
                None,
                "shipyard-env",
            ));
        }

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.endpoint_url.is_some())
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), UploadError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| UploadError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::other(e),
            })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::Store {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!("Stored s3://{}/{}", bucket, key);
        Ok(())
    }
}
