//! Types used by the upload orchestrator

use std::fmt::{Display, Formatter, Result as FmtResult};

use expensa_core::{AppError, IdentityClaim, StorageBackend, StoredFileReference};

/// Where a single upload currently is.
///
/// The happy path is `AwaitingAuth -> Decoding -> Validating -> Storing -> Done`;
/// `Rejected` can be entered from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    AwaitingAuth,
    Decoding,
    Validating,
    Storing,
    Done,
    Rejected,
}

impl UploadStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStage::Done | UploadStage::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::AwaitingAuth => "awaiting_auth",
            UploadStage::Decoding => "decoding",
            UploadStage::Validating => "validating",
            UploadStage::Storing => "storing",
            UploadStage::Done => "done",
            UploadStage::Rejected => "rejected",
        }
    }
}

impl Display for UploadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Raw request pieces the orchestrator needs. Transport agnostic.
pub struct InboundUpload<S> {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    /// Declared body length, used only to size the accumulation buffer
    pub content_length: Option<u64>,
    pub body: S,
}

/// A finished upload, handed back for persistence by the caller.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub claim: IdentityClaim,
    pub reference: StoredFileReference,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub storage: StorageBackend,
    /// Scalar form fields in wire order
    pub fields: Vec<(String, String)>,
}

/// Terminal failure of an upload, tagged with the stage it failed in.
#[derive(Debug, thiserror::Error)]
#[error("upload rejected while {stage}: {error}")]
pub struct UploadRejection {
    pub stage: UploadStage,
    #[source]
    pub error: AppError,
}

impl UploadRejection {
    pub fn new(stage: UploadStage, error: impl Into<AppError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}
