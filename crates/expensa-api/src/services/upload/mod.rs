//! Bill upload pipeline
//!
//! Composes the token gate, body accumulation, multipart decoding, policy
//! validation and storage into a single per-request state machine.

mod orchestrator;
mod types;

pub use orchestrator::UploadOrchestrator;
pub use types::{InboundUpload, UploadOutcome, UploadRejection, UploadStage};
