use crate::{InlineStorage, ObjectStoreStorage, Storage, StorageBackend, StorageError, StorageResult};
use expensa_core::config::ObjectStoreConfig;
use expensa_core::Config;
use std::sync::Arc;

/// Create the storage backend selected at startup.
pub fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        StorageBackend::Inline => Ok(Arc::new(InlineStorage::new())),
        StorageBackend::External => {
            let object_store = config.object_store().ok_or_else(|| {
                StorageError::ConfigError("No object store configured".to_string())
            })?;
            let storage = create_object_store(object_store)?;
            Ok(Arc::new(storage))
        }
    }
}

pub fn create_object_store(config: &ObjectStoreConfig) -> StorageResult<ObjectStoreStorage> {
    match config {
        #[cfg(feature = "storage-s3")]
        ObjectStoreConfig::S3 {
            bucket,
            region,
            endpoint,
        } => ObjectStoreStorage::s3(bucket.clone(), region.clone(), endpoint.clone()),

        #[cfg(not(feature = "storage-s3"))]
        ObjectStoreConfig::S3 { .. } => Err(StorageError::ConfigError(
            "S3 storage not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-azure")]
        ObjectStoreConfig::Azure {
            account,
            access_key,
            container,
            endpoint,
        } => ObjectStoreStorage::azure(
            account.clone(),
            access_key.clone(),
            container.clone(),
            endpoint.clone(),
        ),

        #[cfg(not(feature = "storage-azure"))]
        ObjectStoreConfig::Azure { .. } => Err(StorageError::ConfigError(
            "Azure storage not available (storage-azure feature not enabled)".to_string(),
        )),
    }
}
