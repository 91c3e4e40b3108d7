//! End-to-end tests: JSON files on disk into an in-memory SurrealDB graph.

use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use triplex_cli::commands::{neighbors, run};
use triplex_cli::factories;
use triplex_config::{DomainSource, TriplexConfig};
use triplex_core::{CountEntry, GraphStore};
use triplex_pipeline::{CancelFlag, NoopObserver};

fn write(dir: &Path, file: &str, document: serde_json::Value) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(file), serde_json::to_string(&document).unwrap()).unwrap();
}

fn fixture() -> (TempDir, TriplexConfig) {
    let dir = TempDir::new().unwrap();
    write(
        &dir.path().join("medicine"),
        "drugs.json",
        json!([
            {"subject": "降压药A", "subject_type": "Product", "predicate": "TREATS",
             "object": "高血压", "object_type": "Medical", "properties": {"dose": "10mg"}},
            {"subject": "降压药A ", "subject_type": "Product", "predicate": "TREATS",
             "object": "高 血压", "object_type": "Medical"}
        ]),
    );
    write(
        &dir.path().join("Insurance"),
        "plans.json",
        json!({"subject": "保险X", "subject_type": "Insurance", "predicate": "COVERS",
               "object": "高血压", "object_type": "Medical",
               "properties": {"limit": {"amount": 10000, "unit": "CNY"}}}),
    );
    write(
        &dir.path().join("Seeds"),
        "conditions.json",
        json!([{"type": "Medical", "name": "糖尿病"}]),
    );

    let mut config = TriplexConfig::default();
    config.store.path = ":memory:".to_string();
    config.sources.base_dir = dir.path().to_path_buf();
    config.sources.domains = vec![
        DomainSource::new("medicine", "medicine"),
        DomainSource::new("insurance", "Insurance"),
    ];
    config.pipeline.batch_size = 1;
    (dir, config)
}

#[tokio::test]
async fn test_run_into_surrealdb_memory_store() {
    let (_dir, config) = fixture();
    let store = factories::create_store(&config.store).await.unwrap();

    let report = run::run_pipeline(
        &config,
        store.clone(),
        Arc::new(NoopObserver),
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.domains.len(), 2);
    assert_eq!(report.domains[0].dedup.removed, 1);
    assert_eq!(report.rows_written(), 2);
    assert_eq!(report.seeds.as_ref().unwrap().written, 1);

    let verify = report.verify.unwrap();
    // 降压药A, 高血压, 保险X and the seeded 糖尿病
    assert_eq!(verify.total_nodes, 4);
    assert_eq!(verify.total_edges, 2);
    assert!(verify.edges_by_domain.contains(&CountEntry::new("medicine", 1)));
    assert_eq!(verify.cross_domain.len(), 1);
    assert_eq!(verify.cross_domain[0].name, "高血压");

    let lookup = neighbors::lookup(store, "高血压", 5).await.unwrap();
    assert_eq!(lookup.triples.len(), 2);
}

#[tokio::test]
async fn test_dry_run_store_leaves_configured_store_alone() {
    let (_dir, config) = fixture();
    let store = factories::create_dry_run_store();

    let report = run::run_pipeline(
        &config,
        store.clone(),
        Arc::new(NoopObserver),
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.rows_written(), 2);
    assert_eq!(store.node_names(None).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_cancelled_run_is_reported() {
    let (_dir, config) = fixture();
    let store = factories::create_dry_run_store();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = run::run_pipeline(&config, store, Arc::new(NoopObserver), &cancel)
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("cancelled"));
}
