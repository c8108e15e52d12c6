//! S3 object store backed by the rust-s3 crate.
//!
//! Talks to AWS S3 by default; an explicit endpoint switches to path-style
//! requests against an S3-compatible service (MinIO, localstack).

use std::borrow::Cow;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::{debug, info};

use crate::core::config::S3Config;
use crate::core::error::{AppError, Result};
use crate::modules::storage::ObjectStore;

pub struct S3ObjectStore {
    bucket: Box<Bucket>,
}

impl S3ObjectStore {
    pub fn new(config: &S3Config) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create S3 credentials: {}", e)))?;

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config.region.parse::<Region>().map_err(|e| {
                AppError::Storage(format!("Invalid AWS region '{}': {}", config.region, e))
            })?,
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| AppError::Storage(format!("Failed to create S3 bucket handle: {}", e)))?;

        if config.endpoint.is_some() {
            bucket.set_path_style();
        }

        info!(
            "S3 object store initialized for bucket: {}, region: {}, endpoint: {}",
            config.bucket,
            config.region,
            config.endpoint.as_deref().unwrap_or("aws")
        );

        Ok(Self { bucket })
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

/// rust-s3 drops one leading `/` when it builds the request path. Keys from an
/// empty environment prefix start with `/` and must keep it, since the
/// returned URL addresses the literal key.
fn request_key(key: &str) -> Cow<'_, str> {
    if key.starts_with('/') {
        Cow::Owned(format!("/{}", key))
    } else {
        Cow::Borrowed(key)
    }
}

fn ensure_success(operation: &str, key: &str, status: u16) -> Result<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(AppError::Storage(format!(
            "S3 {} '{}' returned status {}",
            operation, key, status
        )))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        let response = self
            .bucket
            .put_object_with_content_type(request_key(key), data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload '{}': {}", key, e)))?;
        ensure_success("put", key, response.status_code())?;

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    async fn copy_object(&self, from: &str, to: &str) -> Result<()> {
        let status = self
            .bucket
            .copy_object_internal(request_key(from), request_key(to))
            .await
            .map_err(|e| {
                AppError::Storage(format!("Failed to copy '{}' to '{}': {}", from, to, e))
            })?;
        ensure_success("copy", from, status)?;

        debug!("Copied '{}' to '{}' in bucket '{}'", from, to, self.bucket.name());
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        let response = self
            .bucket
            .delete_object(request_key(key))
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete '{}': {}", key, e)))?;
        ensure_success("delete", key, response.status_code())?;

        debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_key_keeps_leading_slash() {
        assert_eq!(request_key("/curriculums/x.pdf"), "//curriculums/x.pdf");
        assert_eq!(
            request_key("production/curriculums/x.pdf"),
            "production/curriculums/x.pdf"
        );
    }

    #[test]
    fn test_ensure_success_accepts_2xx_only() {
        assert!(ensure_success("delete", "k", 204).is_ok());
        assert!(ensure_success("put", "k", 200).is_ok());
        assert!(matches!(
            ensure_success("put", "k", 403),
            Err(AppError::Storage(msg)) if msg.contains("403")
        ));
    }
}
