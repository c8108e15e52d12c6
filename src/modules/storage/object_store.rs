use async_trait::async_trait;

use crate::core::error::Result;

/// Minimal object-store surface the storage adapter needs.
///
/// Keys are full object keys within one bucket. Implementations report any
/// non-success store response as `AppError::Storage`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Server-side copy within the same bucket
    async fn copy_object(&self, from: &str, to: &str) -> Result<()>;

    /// Deleting a missing key succeeds
    async fn delete_object(&self, key: &str) -> Result<()>;
}
