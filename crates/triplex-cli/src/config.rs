//! Effective configuration: config file plus command-line overrides

use anyhow::{Context, Result};
use tracing::debug;
use triplex_config::{ConfigLoader, TriplexConfig};

use crate::cli::GlobalArgs;

/// Apply command-line overrides on top of file values.
pub fn apply_overrides(config: &mut TriplexConfig, args: &GlobalArgs) {
    if let Some(path) = &args.db_path {
        debug!("Overriding store.path with {}", path);
        config.store.path = path.clone();
    }
    if let Some(base_dir) = &args.base_dir {
        debug!("Overriding sources.base_dir with {}", base_dir.display());
        config.sources.base_dir = base_dir.clone();
    }
    if let Some(batch_size) = args.batch_size {
        config.pipeline.batch_size = batch_size;
    }
    if args.no_clear {
        config.pipeline.clear_before_load = false;
    }
}

/// Load the config file (explicit, default location or built-in defaults),
/// apply overrides and validate the result.
pub async fn load(args: &GlobalArgs) -> Result<TriplexConfig> {
    let mut config = ConfigLoader::load(args.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    apply_overrides(&mut config, args);
    config
        .validate()
        .context("Configuration is not usable")?;
    Ok(config)
}
