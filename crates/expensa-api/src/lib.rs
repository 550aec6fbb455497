//! Expensa API Library
//!
//! HTTP surface of the bill upload pipeline: routes, the upload orchestrator,
//! error rendering and application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod auth;
pub mod constants;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::upload::{UploadOrchestrator, UploadOutcome, UploadStage};
pub use state::AppState;
