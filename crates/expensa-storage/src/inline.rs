use crate::traits::{Storage, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use expensa_core::StoredFileReference;

/// Fallback used when no object store is configured: the file travels back to
/// the caller as a `data:` URI and nothing is kept server-side.
#[derive(Clone, Debug, Default)]
pub struct InlineStorage;

impl InlineStorage {
    pub fn new() -> Self {
        Self
    }
}

pub fn data_uri(content_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", content_type.trim(), STANDARD.encode(data))
}

#[async_trait]
impl Storage for InlineStorage {
    async fn store(
        &self,
        owner_id: &str,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<StoredFileReference> {
        let url = data_uri(content_type, &data);
        tracing::info!(
            owner_id = %owner_id,
            filename = %filename,
            size_bytes = data.len(),
            encoded_bytes = url.len(),
            "File encoded inline"
        );
        Ok(StoredFileReference::new(url))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Inline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_returns_data_uri() {
        let storage = InlineStorage::new();
        let reference = storage
            .store(
                "u1",
                "r.png",
                "image/png",
                Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF]),
            )
            .await
            .unwrap();
        assert_eq!(reference.url, "data:image/png;base64,3q2+7w==");
        assert!(reference.is_inline());
    }

    #[tokio::test]
    async fn test_data_uri_round_trips() {
        let payload: Vec<u8> = (0..=255).collect();
        let reference = InlineStorage
            .store("u1", "doc.pdf", "application/pdf", Bytes::from(payload.clone()))
            .await
            .unwrap();
        let encoded = reference
            .url
            .strip_prefix("data:application/pdf;base64,")
            .unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), payload);
        assert_eq!(InlineStorage.backend_type(), StorageBackend::Inline);
    }
}
