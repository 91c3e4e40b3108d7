//! Config Command - print the effective configuration

use anyhow::{Context, Result};
use triplex_config::{ConfigLoader, TriplexConfig};

use crate::cli::ConfigFormat;

/// Execute config command
pub fn execute(config: TriplexConfig, format: ConfigFormat) -> Result<()> {
    println!("{}", render(&config, format)?);
    Ok(())
}

pub fn render(config: &TriplexConfig, format: ConfigFormat) -> Result<String> {
    match format {
        ConfigFormat::Toml => {
            ConfigLoader::to_toml(config).context("Failed to render configuration as TOML")
        }
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .context("Failed to render configuration as JSON"),
    }
}
