use crate::keys::generate_storage_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use expensa_core::StoredFileReference;
use object_store::path::Path;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;

/// Object store backed storage (S3-compatible buckets, Azure Blob containers)
#[derive(Clone)]
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    /// Bucket or container name, for logs
    location: String,
    /// Public URL prefix objects are reachable under, without trailing slash
    public_base_url: String,
}

impl ObjectStoreStorage {
    /// Wrap an already built store.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        location: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            location: location.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create storage for an S3 bucket
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    ///
    /// Credentials are read from the standard `AWS_*` environment variables.
    #[cfg(feature = "storage-s3")]
    pub fn s3(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        use object_store::aws::AmazonS3Builder;

        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let public_base_url = s3_public_base_url(&bucket, &region, endpoint_url.as_deref());
        Ok(Self::new(Arc::new(store), bucket, public_base_url))
    }

    /// Create storage for an Azure Blob container authenticated with a shared key.
    ///
    /// The returned URLs are only readable if the container's public access
    /// level is `blob`; writes succeed either way.
    #[cfg(feature = "storage-azure")]
    pub fn azure(
        account: String,
        access_key: String,
        container: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        use object_store::azure::MicrosoftAzureBuilder;

        let mut builder = MicrosoftAzureBuilder::new()
            .with_account(account.clone())
            .with_access_key(access_key)
            .with_container_name(container.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let public_base_url = azure_public_base_url(&account, &container, endpoint_url.as_deref());
        Ok(Self::new(Arc::new(store), container, public_base_url))
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// For AWS S3: `https://{bucket}.s3.{region}.amazonaws.com`.
/// For S3-compatible providers, path-style under the endpoint: `{endpoint}/{bucket}`.
pub fn s3_public_base_url(bucket: &str, region: &str, endpoint_url: Option<&str>) -> String {
    match endpoint_url {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
    }
}

/// `https://{account}.blob.core.windows.net/{container}`, or `{endpoint}/{container}`
/// when an explicit blob endpoint is configured.
pub fn azure_public_base_url(account: &str, container: &str, endpoint_url: Option<&str>) -> String {
    match endpoint_url {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), container),
        None => format!("https://{}.blob.core.windows.net/{}", account, container),
    }
}

#[async_trait]
impl Storage for ObjectStoreStorage {
    async fn store(
        &self,
        owner_id: &str,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<StoredFileReference> {
        let key = generate_storage_key(owner_id, filename)?;
        let size = data.len() as u64;
        let location = Path::from(key.clone());

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let mut opts = PutOptions::default();
        opts.attributes = attributes;

        let start = std::time::Instant::now();

        let result = self
            .store
            .put_opts(&location, PutPayload::from(data), opts)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                location = %self.location,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object store upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let url = self.public_url(&key);

        tracing::info!(
            location = %self.location,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store upload successful"
        );

        Ok(StoredFileReference::new(url))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::External
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::ObjectStoreExt;

    const BASE: &str = "https://bills.s3.us-east-1.amazonaws.com";

    fn storage() -> (Arc<InMemory>, ObjectStoreStorage) {
        let memory = Arc::new(InMemory::new());
        let storage = ObjectStoreStorage::new(memory.clone(), "bills", format!("{}/", BASE));
        (memory, storage)
    }

    #[tokio::test]
    async fn test_store_writes_object_with_content_type() {
        let (memory, storage) = storage();
        let data = Bytes::from(vec![7u8; 1000]);

        let reference = storage
            .store("64f1c2", "r.png", "image/png", data.clone())
            .await
            .unwrap();

        let key = reference
            .url
            .strip_prefix(&format!("{}/", BASE))
            .unwrap()
            .to_string();
        assert!(key.starts_with("64f1c2/"));
        assert!(key.ends_with(".png"));

        let object = memory.get(&Path::from(key)).await.unwrap();
        assert_eq!(
            object
                .attributes
                .get(&Attribute::ContentType)
                .map(AsRef::<str>::as_ref),
            Some("image/png")
        );
        assert_eq!(object.bytes().await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_invalid_owner_rejected_before_write() {
        let (_, storage) = storage();
        let result = storage
            .store("../", "r.png", "image/png", Bytes::from_static(b"x"))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_public_base_urls() {
        assert_eq!(
            s3_public_base_url("bills", "eu-west-1", None),
            "https://bills.s3.eu-west-1.amazonaws.com"
        );
        assert_eq!(
            s3_public_base_url("bills", "us-east-1", Some("http://localhost:9000/")),
            "http://localhost:9000/bills"
        );
        assert_eq!(
            azure_public_base_url("acme", "bills", None),
            "https://acme.blob.core.windows.net/bills"
        );
        assert_eq!(
            azure_public_base_url("dev", "bills", Some("http://127.0.0.1:10000/dev")),
            "http://127.0.0.1:10000/dev/bills"
        );
    }

    #[test]
    fn test_backend_type() {
        let (_, storage) = storage();
        assert_eq!(storage.backend_type(), StorageBackend::External);
        assert_eq!(storage.public_url("a/b.png"), format!("{}/a/b.png", BASE));
    }
}
