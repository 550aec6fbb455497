//! Storage setup and initialization

use anyhow::Result;
use expensa_core::Config;
use expensa_storage::{create_storage, Storage};
use std::sync::Arc;

/// Build the one storage backend this process will use.
pub fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let selection = config.backend_selection();
    let storage = create_storage(config)?;

    tracing::info!(
        backend = %storage.backend_type(),
        source = %selection.source,
        provider = ?config.object_store().map(|s| s.provider()),
        "Storage backend selected"
    );

    Ok(storage)
}
