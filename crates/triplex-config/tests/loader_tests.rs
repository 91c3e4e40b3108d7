//! Config loading tests against real files

use std::path::PathBuf;
use tempfile::TempDir;
use triplex_config::{ConfigError, ConfigLoader, DedupPolicy, DomainSource, TriplexConfig};

#[tokio::test]
async fn test_load_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("triplex.toml");
    std::fs::write(
        &path,
        r#"
[store]
path = ":memory:"

[pipeline]
batch_size = 50
dedup_policy = "union"

[sources]
base_dir = "/srv/data"

[[sources.domains]]
name = "medicine"
dir = "medicine"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).await.unwrap();
    assert!(config.store.is_memory());
    assert_eq!(config.store.namespace, "triplex");
    assert_eq!(config.pipeline.batch_size, 50);
    assert_eq!(config.pipeline.dedup_policy, DedupPolicy::UnionProperties);
    assert!(config.pipeline.clear_before_load);
    assert_eq!(
        config.sources.domains,
        vec![DomainSource::new("medicine", "medicine")]
    );
    assert_eq!(config.sources.base_dir, PathBuf::from("/srv/data"));
    assert!(config.validate().is_ok());
}

#[tokio::test]
async fn test_unknown_section_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[neo4j]\nuri = \"bolt://localhost\"\n").unwrap();

    let err = ConfigLoader::load_from_file(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[tokio::test]
async fn test_missing_explicit_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = ConfigLoader::load(Some(&path)).await.unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_default_config_survives_toml_rendering() {
    let config = TriplexConfig::default();
    let rendered = ConfigLoader::to_toml(&config).unwrap();
    let parsed = ConfigLoader::load_from_str(&rendered).unwrap();
    assert_eq!(parsed, config);
}
