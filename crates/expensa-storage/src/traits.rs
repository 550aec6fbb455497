//! Storage abstraction trait

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use expensa_core::StoredFileReference;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// A single write per upload; there is no retry and no fallback to another
/// backend once the process has started.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist `data` on behalf of `owner_id` and return a reference that is
    /// sufficient on its own to retrieve or display the file.
    async fn store(
        &self,
        owner_id: &str,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<StoredFileReference>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
