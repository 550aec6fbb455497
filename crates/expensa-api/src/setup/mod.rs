//! Application setup and initialization
//!
//! Everything that happens once per process before the first request: config
//! validation, tracing, backend selection, state and routes.

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::auth::CredentialCheck;
use crate::services::upload::UploadOrchestrator;
use crate::state::AppState;
use anyhow::{Context, Result};
use expensa_core::{Config, TokenCodec};
use expensa_processing::UploadValidator;
use expensa_storage::Storage;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format(), config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let storage = storage::setup_storage(&config)?;
    let state = build_state(config.clone(), Arc::new(TokenCodec::new()), storage);
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Wire the upload pipeline around an already built storage backend.
pub fn build_state(
    config: Config,
    credentials: Arc<dyn CredentialCheck>,
    storage: Arc<dyn Storage>,
) -> Arc<AppState> {
    let validator = UploadValidator::new(config.upload_policy());
    let orchestrator = UploadOrchestrator::new(credentials, validator, storage);
    Arc::new(AppState::new(config, orchestrator))
}
