//! Upload orchestrator
//!
//! Drives one request through `AwaitingAuth -> Decoding -> Validating -> Storing
//! -> Done`. Each request owns its own buffer; the only shared pieces are the
//! credential check, the validator policy and the storage backend, all read-only.

use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use expensa_core::{AppError, StorageBackend};
use expensa_processing::{BodyAccumulator, MultipartDecoder, UploadValidator};
use expensa_storage::Storage;
use futures::Stream;

use super::types::{InboundUpload, UploadOutcome, UploadRejection, UploadStage};
use crate::auth::CredentialCheck;
use crate::error::IntoAppError;

pub struct UploadOrchestrator {
    credentials: Arc<dyn CredentialCheck>,
    validator: UploadValidator,
    storage: Arc<dyn Storage>,
}

impl UploadOrchestrator {
    pub fn new(
        credentials: Arc<dyn CredentialCheck>,
        validator: UploadValidator,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            credentials,
            validator,
            storage,
        }
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage.backend_type()
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    /// Run a single upload to completion.
    ///
    /// The bearer token and the multipart boundary are both checked from headers
    /// before any of the body is read. Decoding starts only once the whole body
    /// has arrived. Only the first file part is validated and stored; further
    /// file parts are ignored.
    #[tracing::instrument(skip(self, upload), fields(subject_id = tracing::field::Empty))]
    pub async fn process<S, E>(
        &self,
        upload: InboundUpload<S>,
    ) -> Result<UploadOutcome, UploadRejection>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let mut stage = UploadStage::AwaitingAuth;
        tracing::debug!(stage = %stage, "Upload started");

        let claim = self
            .credentials
            .check(upload.authorization.as_deref())
            .ok_or_else(|| {
                reject(
                    stage,
                    AppError::Unauthorized("missing, malformed or expired token".to_string()),
                )
            })?;
        tracing::Span::current().record("subject_id", claim.subject_id.as_str());

        stage = advance(stage, UploadStage::Decoding);
        let content_type = upload.content_type.as_deref().ok_or_else(|| {
            reject(
                stage,
                AppError::MalformedUpload("missing Content-Type header".to_string()),
            )
        })?;
        let decoder = MultipartDecoder::from_content_type(content_type)
            .map_err(|e| reject(stage, e.into_app_error()))?;

        let body = BodyAccumulator::collect(upload.body, upload.content_length)
            .await
            .map_err(|e| {
                reject(
                    stage,
                    AppError::MalformedUpload(format!("failed to read request body: {}", e)),
                )
            })?;

        let form = decoder
            .decode(&body)
            .map_err(|e| reject(stage, e.into_app_error()))?;
        let fields: Vec<(String, String)> = form
            .fields()
            .map(|part| (part.field_name.clone(), part.text().into_owned()))
            .collect();
        let file_parts = form.files().count();
        let file = form
            .into_first_file()
            .ok_or_else(|| reject(stage, AppError::MissingFile))?;
        if file_parts > 1 {
            tracing::debug!(
                ignored = file_parts - 1,
                "Only the first file part is processed"
            );
        }

        stage = advance(stage, UploadStage::Validating);
        self.validator
            .validate(&file)
            .map_err(|e| reject(stage, e.into_app_error()))?;

        stage = advance(stage, UploadStage::Storing);
        let filename = file.filename.clone().unwrap_or_default();
        let size = file.size();
        let reference = self
            .storage
            .store(
                &claim.subject_id,
                &filename,
                &file.content_type,
                file.payload,
            )
            .await
            .map_err(|e| reject(stage, e.into_app_error()))?;

        advance(stage, UploadStage::Done);
        let storage = self.storage.backend_type();
        tracing::info!(
            filename = %filename,
            size_bytes = size,
            storage = %storage,
            "Bill upload complete"
        );

        Ok(UploadOutcome {
            claim,
            reference,
            filename,
            content_type: file.content_type,
            size,
            storage,
            fields,
        })
    }
}

fn advance(from: UploadStage, to: UploadStage) -> UploadStage {
    tracing::debug!(from = %from, to = %to, "Upload stage transition");
    to
}

fn reject(stage: UploadStage, error: AppError) -> UploadRejection {
    tracing::debug!(
        from = %stage,
        to = %UploadStage::Rejected,
        error = %error,
        "Upload rejected"
    );
    UploadRejection::new(stage, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use expensa_core::{IdentityClaim, StoredFileReference, TokenCodec, UploadPolicy};
    use expensa_storage::{InlineStorage, ObjectStoreStorage, StorageError, StorageResult};
    use futures::stream;
    use object_store::memory::InMemory;

    const BOUNDARY: &str = "XyZ";

    struct FixedIdentity(Option<IdentityClaim>);

    impl CredentialCheck for FixedIdentity {
        fn check(&self, _authorization: Option<&str>) -> Option<IdentityClaim> {
            self.0.clone()
        }
    }

    struct BrokenStorage;

    #[async_trait]
    impl Storage for BrokenStorage {
        async fn store(
            &self,
            _owner_id: &str,
            _filename: &str,
            _content_type: &str,
            _data: Bytes,
        ) -> StorageResult<StoredFileReference> {
            Err(StorageError::UploadFailed("connection reset".to_string()))
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::External
        }
    }

    fn alice() -> IdentityClaim {
        IdentityClaim::new("u-42", "alice", expensa_core::token::now_epoch_ms())
    }

    fn orchestrator(storage: Arc<dyn Storage>) -> UploadOrchestrator {
        UploadOrchestrator::new(
            Arc::new(FixedIdentity(Some(alice()))),
            UploadValidator::new(UploadPolicy::default()),
            storage,
        )
    }

    fn bill_body(content_type: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\nFood\r\n\
                 --{b}\r\nContent-Disposition: form-data; name=\"bill\"; filename=\"r.png\"\r\n\
                 Content-Type: {ct}\r\n\r\n",
                b = BOUNDARY,
                ct = content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn inbound(
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> InboundUpload<impl Stream<Item = Result<Bytes, std::io::Error>>> {
        // Split the body in two to exercise accumulation across chunks.
        let mid = body.len() / 2;
        let body = Bytes::from(body);
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(body.slice(..mid)), Ok(body.slice(mid..))];
        InboundUpload {
            authorization: Some("Bearer whatever".to_string()),
            content_type: content_type.map(String::from),
            content_length: None,
            body: stream::iter(chunks),
        }
    }

    fn multipart_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    #[tokio::test]
    async fn test_inline_upload_done() {
        let orch = orchestrator(Arc::new(InlineStorage::new()));
        let outcome = orch
            .process(inbound(
                Some(&multipart_type()),
                bill_body("image/png", &[0xDE, 0xAD, 0xBE, 0xEF]),
            ))
            .await
            .unwrap();

        assert_eq!(outcome.reference.url, "data:image/png;base64,3q2+7w==");
        assert_eq!(outcome.filename, "r.png");
        assert_eq!(outcome.size, 4);
        assert_eq!(outcome.storage, StorageBackend::Inline);
        assert_eq!(outcome.claim.subject_id, "u-42");
        assert_eq!(
            outcome.fields,
            vec![("category".to_string(), "Food".to_string())]
        );
    }

    #[tokio::test]
    async fn test_external_upload_key_is_owner_scoped() {
        let store = ObjectStoreStorage::new(
            Arc::new(InMemory::new()),
            "bills",
            "https://bills.s3.us-east-1.amazonaws.com",
        );
        let orch = orchestrator(Arc::new(store));
        let outcome = orch
            .process(inbound(
                Some(&multipart_type()),
                bill_body("image/png", &[7u8; 1000]),
            ))
            .await
            .unwrap();

        assert!(outcome
            .reference
            .url
            .starts_with("https://bills.s3.us-east-1.amazonaws.com/u-42/"));
        assert!(outcome.reference.url.ends_with(".png"));
        assert_eq!(outcome.size, 1000);
        assert_eq!(outcome.storage, StorageBackend::External);
    }

    #[tokio::test]
    async fn test_rejected_without_identity() {
        let orch = UploadOrchestrator::new(
            Arc::new(FixedIdentity(None)),
            UploadValidator::new(UploadPolicy::default()),
            Arc::new(InlineStorage::new()),
        );
        let err = orch
            .process(inbound(Some(&multipart_type()), bill_body("image/png", b"x")))
            .await
            .unwrap_err();
        assert_eq!(err.stage, UploadStage::AwaitingAuth);
        assert!(matches!(err.error, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_real_token_codec_gate() {
        let codec = TokenCodec::new();
        let token = codec.issue("u-7", "bob").unwrap();
        let orch = UploadOrchestrator::new(
            Arc::new(codec),
            UploadValidator::new(UploadPolicy::default()),
            Arc::new(InlineStorage::new()),
        );
        let mut upload = inbound(Some(&multipart_type()), bill_body("application/pdf", b"%PDF"));
        upload.authorization = Some(format!("Bearer {}", token));
        let outcome = orch.process(upload).await.unwrap();
        assert_eq!(outcome.claim.subject_id, "u-7");
        assert!(outcome.reference.url.starts_with("data:application/pdf;base64,"));
    }

    #[tokio::test]
    async fn test_missing_boundary_rejected_while_decoding() {
        let orch = orchestrator(Arc::new(InlineStorage::new()));
        let err = orch
            .process(inbound(
                Some("multipart/form-data"),
                bill_body("image/png", b"x"),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.stage, UploadStage::Decoding);
        assert!(matches!(err.error, AppError::MalformedUpload(_)));

        let err = orch
            .process(inbound(None, bill_body("image/png", b"x")))
            .await
            .unwrap_err();
        assert_eq!(err.stage, UploadStage::Decoding);
    }

    #[tokio::test]
    async fn test_no_file_part() {
        let orch = orchestrator(Arc::new(InlineStorage::new()));
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\nFood\r\n--{b}--\r\n",
            b = BOUNDARY
        );
        let err = orch
            .process(inbound(Some(&multipart_type()), body.into_bytes()))
            .await
            .unwrap_err();
        assert_eq!(err.stage, UploadStage::Decoding);
        assert!(matches!(err.error, AppError::MissingFile));
    }

    #[tokio::test]
    async fn test_policy_violations_never_reach_storage() {
        // BrokenStorage would turn any store attempt into BackendFailure.
        let orch = orchestrator(Arc::new(BrokenStorage));

        let err = orch
            .process(inbound(
                Some(&multipart_type()),
                bill_body("application/zip", b"PK"),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.stage, UploadStage::Validating);
        assert!(matches!(err.error, AppError::UnsupportedMediaType(_)));

        let too_big = vec![0u8; UploadPolicy::default().max_bytes + 1];
        let err = orch
            .process(inbound(Some(&multipart_type()), bill_body("image/png", &too_big)))
            .await
            .unwrap_err();
        assert_eq!(err.stage, UploadStage::Validating);
        assert!(matches!(err.error, AppError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_rejected_while_storing() {
        let orch = orchestrator(Arc::new(BrokenStorage));
        let err = orch
            .process(inbound(Some(&multipart_type()), bill_body("image/png", b"x")))
            .await
            .unwrap_err();
        assert_eq!(err.stage, UploadStage::Storing);
        assert!(matches!(err.error, AppError::BackendFailure(_)));
    }

    #[tokio::test]
    async fn test_body_read_error() {
        let orch = orchestrator(Arc::new(InlineStorage::new()));
        let upload = InboundUpload {
            authorization: None,
            content_type: Some(multipart_type()),
            content_length: Some(10),
            body: stream::iter(vec![
                Ok(Bytes::from_static(b"--XyZ")),
                Err(std::io::Error::other("client went away")),
            ]),
        };
        let err = orch.process(upload).await.unwrap_err();
        assert_eq!(err.stage, UploadStage::Decoding);
        assert!(matches!(err.error, AppError::MalformedUpload(_)));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(UploadStage::AwaitingAuth.to_string(), "awaiting_auth");
        assert!(UploadStage::Rejected.is_terminal());
        assert!(!UploadStage::Storing.is_terminal());
    }
}
