//! Store construction for commands

use anyhow::{Context, Result};
use std::sync::Arc;
use triplex_config::StoreConfig;
use triplex_core::{GraphStore, InMemoryGraphStore};
use triplex_surrealdb::SurrealGraphStore;

/// Open the configured SurrealDB store.
///
/// Each command opens its own handle; RocksDB allows one process at a time.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn GraphStore>> {
    let store = SurrealGraphStore::connect(config)
        .await
        .with_context(|| format!("Failed to open graph store at {}", config.path))?;
    Ok(Arc::new(store))
}

/// Throwaway store for `run --dry-run`
pub fn create_dry_run_store() -> Arc<dyn GraphStore> {
    Arc::new(InMemoryGraphStore::new())
}
