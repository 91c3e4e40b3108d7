//! Configuration model
//!
//! Every section implements `Default`, so a config file only needs to name the
//! values it changes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::ConfigError;

/// Top-level configuration for an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriplexConfig {
    /// Graph store location
    pub store: StoreConfig,
    /// Input directories
    pub sources: SourcesConfig,
    /// Batching, clearing and deduplication behavior
    pub pipeline: PipelineConfig,
    /// Index provisioning
    pub indexes: IndexConfig,
    /// Post-load verification report
    pub verify: VerifyConfig,
}

impl TriplexConfig {
    /// Check the configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.batch_size must be at least 1".to_string(),
            ));
        }
        if self.pipeline.clear_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.clear_chunk_size must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for domain in &self.sources.domains {
            if domain.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "sources.domains entries need a non-empty name".to_string(),
                ));
            }
            if !seen.insert(domain.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate domain name '{}' in sources.domains",
                    domain.name
                )));
            }
        }

        if self.indexes.property.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "indexes.property must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Graph store configuration
///
/// `path` selects the engine: `":memory:"` (or empty) for an in-memory
/// database, anything else is treated as a RocksDB directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Database path or `":memory:"`
    pub path: String,
    /// Namespace inside the store
    pub namespace: String,
    /// Database inside the namespace
    pub database: String,
}

impl StoreConfig {
    /// Whether this configuration selects the in-memory engine
    pub fn is_memory(&self) -> bool {
        self.path.is_empty() || self.path == ":memory:"
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "./triplex.db".to_string(),
            namespace: "triplex".to_string(),
            database: "graph".to_string(),
        }
    }
}

/// One upstream dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainSource {
    /// Domain name stamped on every record as `source_domain`
    pub name: String,
    /// Directory holding the domain's JSON files; relative paths resolve
    /// against [`SourcesConfig::base_dir`]
    pub dir: PathBuf,
}

impl DomainSource {
    /// Convenience constructor
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }
}

/// Input directory configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// Root directory for relative domain and seed directories
    pub base_dir: PathBuf,
    /// Directory of curated seed records
    pub seed_dir: Option<PathBuf>,
    /// Domains in load and write order
    pub domains: Vec<DomainSource>,
}

impl SourcesConfig {
    /// Resolved directory for a domain
    pub fn domain_dir(&self, domain: &DomainSource) -> PathBuf {
        if domain.dir.is_absolute() {
            domain.dir.clone()
        } else {
            self.base_dir.join(&domain.dir)
        }
    }

    /// Resolved seed directory, if one is configured
    pub fn seed_path(&self) -> Option<PathBuf> {
        self.seed_dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                self.base_dir.join(dir)
            }
        })
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./data"),
            seed_dir: Some(PathBuf::from("Seeds")),
            domains: vec![
                DomainSource::new("medicine", "medicine"),
                DomainSource::new("insurance", "Insurance"),
                DomainSource::new("nursing_home", "NursingHome"),
            ],
        }
    }
}

/// How records sharing a dedup key are collapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DedupPolicy {
    /// Keep the record with strictly more properties; ties keep the first seen
    #[default]
    #[serde(rename = "richest")]
    RichestWins,
    /// Keep the first-seen record and add property keys it lacks from later
    /// records with the same key
    #[serde(rename = "union")]
    UnionProperties,
}

/// Pipeline behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Records per write transaction
    pub batch_size: usize,
    /// Clear the store before loading
    pub clear_before_load: bool,
    /// Nodes deleted per clearing round
    pub clear_chunk_size: usize,
    /// Deduplication policy
    pub dedup_policy: DedupPolicy,
    /// Drop records whose normalized subject or object is empty
    pub reject_empty_endpoints: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            clear_before_load: true,
            clear_chunk_size: 10_000,
            dedup_policy: DedupPolicy::RichestWins,
            reject_empty_endpoints: false,
        }
    }
}

/// Labels indexed on the node key property before writing
pub const DEFAULT_INDEX_LABELS: &[&str] = &[
    "Product",
    "Medical",
    "Brand",
    "Company",
    "Insurance",
    "Benefit",
    "Condition",
    "Exclusion",
    "Eligibility",
    "Org",
    "District",
    "Province",
    "ProductCategory",
    "Service",
];

/// Index provisioning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Labels that always get an index
    pub labels: Vec<String>,
    /// Indexed property
    pub property: String,
    /// Also index every label observed in the loaded records and seeds
    pub include_observed: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            labels: DEFAULT_INDEX_LABELS.iter().map(|s| s.to_string()).collect(),
            property: "name".to_string(),
            include_observed: true,
        }
    }
}

/// Verification report settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Produce the report after a run
    pub enabled: bool,
    /// Example rows per report section
    pub sample_limit: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_limit: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = TriplexConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.batch_size, 500);
        assert_eq!(config.pipeline.clear_chunk_size, 10_000);
        assert_eq!(config.sources.domains.len(), 3);
        assert_eq!(config.indexes.labels.len(), DEFAULT_INDEX_LABELS.len());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = TriplexConfig::default();
        config.pipeline.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_duplicate_domain_rejected() {
        let mut config = TriplexConfig::default();
        config
            .sources
            .domains
            .push(DomainSource::new("medicine", "other"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate domain name 'medicine'"));
    }

    #[test]
    fn test_relative_and_absolute_domain_dirs() {
        let sources = SourcesConfig {
            base_dir: PathBuf::from("/data"),
            domains: vec![],
            seed_dir: Some(PathBuf::from("Seeds")),
        };
        let relative = DomainSource::new("a", "medicine");
        let absolute = DomainSource::new("b", "/elsewhere/insurance");

        assert_eq!(sources.domain_dir(&relative), PathBuf::from("/data/medicine"));
        assert_eq!(
            sources.domain_dir(&absolute),
            PathBuf::from("/elsewhere/insurance")
        );
        assert_eq!(sources.seed_path(), Some(PathBuf::from("/data/Seeds")));
    }

    #[test]
    fn test_memory_store_detection() {
        let mut store = StoreConfig::default();
        assert!(!store.is_memory());
        store.path = ":memory:".to_string();
        assert!(store.is_memory());
        store.path.clear();
        assert!(store.is_memory());
    }
}
