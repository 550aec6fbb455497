//! Application state shared by all handlers.
//!
//! Everything here is built once at startup and only read afterwards.

use crate::services::upload::UploadOrchestrator;
use expensa_core::{Config, StorageBackend};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub orchestrator: Arc<UploadOrchestrator>,
    /// Error bodies may carry `details` outside production
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(config: Config, orchestrator: UploadOrchestrator) -> Self {
        Self {
            expose_error_details: !config.is_production(),
            config,
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.orchestrator.storage_backend()
    }
}
