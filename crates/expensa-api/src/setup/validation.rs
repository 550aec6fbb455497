//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use expensa_core::{Config, StorageBackend};

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && config.storage_backend() == StorageBackend::Inline {
        tracing::warn!(
            "No object store configured in production - bills will be returned as inline data URIs"
        );
    }

    Ok(())
}
