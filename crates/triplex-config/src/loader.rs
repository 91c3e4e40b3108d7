//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::TriplexConfig;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`TriplexConfig`]
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// The configuration parsed but holds unusable values
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Loads [`TriplexConfig`] from disk
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default config location: `<config dir>/triplex/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("triplex").join("config.toml"))
    }

    /// Parse configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<TriplexConfig, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Read and parse a configuration file
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<TriplexConfig, ConfigError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load an explicit file, else the default location if it exists, else
    /// built-in defaults.
    ///
    /// An explicitly named file that cannot be read is an error; a missing
    /// default file is not.
    pub async fn load(explicit: Option<&Path>) -> Result<TriplexConfig, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path).await;
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path).await,
            _ => {
                debug!("No config file found, using defaults");
                Ok(TriplexConfig::default())
            }
        }
    }

    /// Render a configuration as pretty TOML
    pub fn to_toml(config: &TriplexConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config)
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize configuration: {}", e)))
    }
}
