//! Storage adapter: validates uploads and moves them into the object store.
//!
//! Object keys follow `{environment_prefix}/{folder}/{file_name}` and public
//! URLs `https://{bucket}.s3.{region}.amazonaws.com/{key}`. Keys are
//! deterministic; uploading the same resolved name twice overwrites.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::core::config::S3Config;
use crate::core::error::{AppError, LocalizedMessage, Result};
use crate::modules::storage::ObjectStore;
use crate::shared::constants::{DEFAULT_MAX_UPLOAD_SIZE, RAW_BUFFER_CONTENT_TYPE};

/// Descriptor returned for every stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadedFileDescriptor {
    #[serde(rename = "originalFileName")]
    pub original_file_name: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileURL")]
    pub file_url: String,
}

/// A multipart file part with its metadata
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub original_filename: Option<String>,
    pub mime_type: String,
    pub size: u64,
    pub data: Bytes,
}

/// What is being uploaded.
///
/// `Buffer` carries no metadata: it is stored as-is under the custom name with
/// a PDF content type and skips validation.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Buffer(Vec<u8>),
    File(RawUpload),
}

#[derive(Debug, Clone)]
pub struct UploadOptions<'a> {
    /// Accepted extensions, without the leading dot
    pub allowed_extensions: &'a [&'a str],
    /// Replaces the original file name (extension is kept)
    pub custom_name: Option<&'a str>,
    /// Overrides the upload's MIME type as the stored Content-Type
    pub content_type: Option<&'a str>,
    pub max_size: u64,
}

impl<'a> UploadOptions<'a> {
    pub fn new(allowed_extensions: &'a [&'a str]) -> Self {
        Self {
            allowed_extensions,
            custom_name: None,
            content_type: None,
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    pub fn custom_name(mut self, name: &'a str) -> Self {
        self.custom_name = Some(name);
        self
    }

    #[allow(dead_code)]
    pub fn content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }
}

pub struct StorageService {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    region: String,
    prefix: String,
    timeout: Duration,
}

impl StorageService {
    pub fn new(store: Arc<dyn ObjectStore>, config: &S3Config) -> Self {
        Self {
            store,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            prefix: config.environment_prefix.clone(),
            timeout: config.request_timeout,
        }
    }

    pub fn object_key(&self, folder: &str, file_name: &str) -> String {
        format!("{}/{}/{}", self.prefix, folder, file_name)
    }

    pub fn file_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }

    /// Validate (for rich uploads) and store a file under `folder`
    pub async fn upload(
        &self,
        source: UploadSource,
        folder: &str,
        options: UploadOptions<'_>,
    ) -> Result<UploadedFileDescriptor> {
        match source {
            UploadSource::Buffer(data) => self.upload_buffer(data, folder, options).await,
            UploadSource::File(file) => self.upload_file(file, folder, options).await,
        }
    }

    /// Copy to the new name, then delete the old one.
    ///
    /// Not atomic: when the delete fails the copy stays and the old object
    /// may remain.
    #[allow(dead_code)]
    pub async fn rename(
        &self,
        folder: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<UploadedFileDescriptor> {
        let old_key = self.object_key(folder, old_name);
        let new_key = self.object_key(folder, new_name);

        self.bounded("copy", self.store.copy_object(&old_key, &new_key))
            .await?;
        self.delete(folder, old_name).await?;

        info!("Renamed '{}' to '{}'", old_key, new_key);

        Ok(UploadedFileDescriptor {
            original_file_name: new_name.to_string(),
            file_name: new_name.to_string(),
            file_url: self.file_url(&new_key),
        })
    }

    pub async fn delete(&self, folder: &str, name: &str) -> Result<()> {
        let key = self.object_key(folder, name);
        self.bounded("delete", self.store.delete_object(&key))
            .await?;

        debug!("Deleted '{}'", key);
        Ok(())
    }

    async fn upload_buffer(
        &self,
        data: Vec<u8>,
        folder: &str,
        options: UploadOptions<'_>,
    ) -> Result<UploadedFileDescriptor> {
        let name = options.custom_name.ok_or_else(|| {
            AppError::Internal("A file name is required to store a raw buffer".to_string())
        })?;

        let key = self.object_key(folder, name);
        self.put(&key, &data, RAW_BUFFER_CONTENT_TYPE).await?;

        Ok(UploadedFileDescriptor {
            original_file_name: name.to_string(),
            file_name: name.to_string(),
            file_url: self.file_url(&key),
        })
    }

    async fn upload_file(
        &self,
        file: RawUpload,
        folder: &str,
        options: UploadOptions<'_>,
    ) -> Result<UploadedFileDescriptor> {
        let mut extension = extension_for_mime(&file.mime_type)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let mut original_file_name = Utc::now().timestamp_millis().to_string();

        if let Some(name) = file.original_filename.as_deref() {
            extension = extension_of(name)
                .map(|ext| format!(".{}", ext))
                .unwrap_or_default();
            original_file_name = name.to_string();
        }

        validate_file(&extension, file.size, &options)?;

        let base_name = match options.custom_name {
            Some(custom) => custom,
            None => strip_extension(&original_file_name),
        };
        let file_name = format!("{}{}", base_name, extension);
        let key = self.object_key(folder, &file_name);

        let content_type = options.content_type.unwrap_or(&file.mime_type);
        self.put(&key, &file.data, content_type).await?;

        info!(
            "Uploaded '{}' as '{}' ({} bytes)",
            original_file_name, key, file.size
        );

        Ok(UploadedFileDescriptor {
            original_file_name,
            file_url: self.file_url(&key),
            file_name,
        })
    }

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        self.bounded("upload", self.store.put_object(key, data, content_type))
            .await
    }

    /// Run a store call under the configured timeout. No retries.
    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                AppError::Storage(format!(
                    "{} timed out after {}s",
                    operation,
                    self.timeout.as_secs_f64()
                ))
            })?
    }
}

/// Reject files whose extension is not allowed or that are too large
fn validate_file(extension: &str, size: u64, options: &UploadOptions<'_>) -> Result<()> {
    let extension = extension.trim_start_matches('.').to_lowercase();
    let allowed = options
        .allowed_extensions
        .iter()
        .any(|ext| ext.trim_start_matches('.').to_lowercase() == extension);

    if extension.is_empty() || !allowed {
        return Err(AppError::InvalidFile(
            LocalizedMessage::new("general.FILE_VALIDATION_FORMAT")
                .arg("extension", options.allowed_extensions.join(",")),
        ));
    }

    if size > options.max_size {
        return Err(AppError::InvalidFile(
            LocalizedMessage::new("general.FILE_VALIDATION_MAX").arg("maximum", options.max_size),
        ));
    }

    Ok(())
}

/// Extension after the last dot, ignoring dot-files like `.env`
fn extension_of(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Everything before the last dot
fn strip_extension(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
}

/// Default extension for a MIME type, used when the upload has no file name
fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    match essence {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        "application/msword" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "application/vnd.ms-excel" => Some("xls"),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some("xlsx"),
        "application/vnd.ms-powerpoint" => Some("ppt"),
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
            Some("pptx")
        }
        "text/csv" => Some("csv"),
        "text/plain" => Some("txt"),
        "video/mp4" => Some("mp4"),
        _ => None,
    }
}
