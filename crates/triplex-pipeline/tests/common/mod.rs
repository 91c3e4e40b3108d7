//! Common test utilities for pipeline tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use triplex_config::{DomainSource, SourcesConfig};
use triplex_core::{
    CountEntry, EdgeKey, EdgeSummary, FlatProperties, GraphStore, Identifier, InMemoryGraphStore,
    NeighborTriple, NodeKey, SeedGroup, StoreError, StoreResult, WriteGroup,
};
use triplex_pipeline::{RunObserver, RunOptions, RunPhase};

/// Input tree on disk: `<root>/<domain>/*.json` plus `<root>/Seeds`.
///
/// The temp directory lives as long as the fixture.
pub struct InputFixture {
    dir: TempDir,
    domains: Vec<String>,
}

impl InputFixture {
    pub fn new(domains: &[&str]) -> Result<Self> {
        let dir = TempDir::new()?;
        for domain in domains {
            std::fs::create_dir_all(dir.path().join(domain))?;
        }
        std::fs::create_dir_all(dir.path().join("Seeds"))?;
        Ok(Self {
            dir,
            domains: domains.iter().map(|d| d.to_string()).collect(),
        })
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Write a JSON document into a domain directory
    pub fn write_json(&self, domain: &str, file: &str, document: &Value) -> Result<()> {
        let text = serde_json::to_string_pretty(document)?;
        self.write_raw(domain, file, &text)
    }

    pub fn write_raw(&self, domain: &str, file: &str, text: &str) -> Result<()> {
        std::fs::write(self.dir.path().join(domain).join(file), text)?;
        Ok(())
    }

    pub fn write_seeds(&self, file: &str, document: &Value) -> Result<()> {
        self.write_json("Seeds", file, document)
    }

    pub fn sources(&self) -> SourcesConfig {
        SourcesConfig {
            base_dir: self.root(),
            seed_dir: Some(PathBuf::from("Seeds")),
            domains: self
                .domains
                .iter()
                .map(|d| DomainSource::new(d.clone(), d.clone()))
                .collect(),
        }
    }
}

/// Options tuned for small fixtures
pub fn test_options() -> RunOptions {
    RunOptions {
        batch_size: 2,
        clear_chunk_size: 3,
        ..Default::default()
    }
}

/// Observer recording every callback as a line of text
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RunObserver for RecordingObserver {
    fn on_phase(&self, phase: &RunPhase) {
        let name = match phase {
            RunPhase::Clearing => "clear".to_string(),
            RunPhase::Indexing { .. } => "index".to_string(),
            RunPhase::Seeding { .. } => "seed".to_string(),
            RunPhase::Writing { domain, .. } => format!("write:{}", domain),
            RunPhase::Verifying => "verify".to_string(),
        };
        self.events.lock().unwrap().push(name);
    }

    fn on_batch_written(&self, domain: &str, batch_index: usize, total: usize, _rows: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("batch:{}:{}/{}", domain, batch_index + 1, total));
    }
}

/// Store that delegates to [`InMemoryGraphStore`] and can be told to fail
/// a chosen `write_batch` call.
#[derive(Clone)]
pub struct FlakyStore {
    inner: Arc<InMemoryGraphStore>,
    state: Arc<Mutex<FlakyState>>,
}

struct FlakyState {
    batch_calls: usize,
    fail_on_call: Option<usize>,
    fail_verification: bool,
    failing_index: Option<String>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InMemoryGraphStore::new()),
            state: Arc::new(Mutex::new(FlakyState {
                batch_calls: 0,
                fail_on_call: None,
                fail_verification: false,
                failing_index: None,
            })),
        }
    }

    /// Fail the `call`-th `write_batch` (zero-based, counted across domains)
    pub fn fail_batch_call(&self, call: usize) {
        self.state.lock().unwrap().fail_on_call = Some(call);
    }

    /// Reject `create_index` for one label
    pub fn fail_index(&self, label: &str) {
        self.state.lock().unwrap().failing_index = Some(label.to_string());
    }

    pub fn fail_verification(&self) {
        self.state.lock().unwrap().fail_verification = true;
    }

    pub fn inner(&self) -> &InMemoryGraphStore {
        &self.inner
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.state.lock().unwrap().fail_verification {
            return Err(StoreError::Connection("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GraphStore for FlakyStore {
    async fn merge_node(
        &self,
        label: &Identifier,
        name: &str,
        domain: Option<&str>,
    ) -> StoreResult<NodeKey> {
        self.inner.merge_node(label, name, domain).await
    }

    async fn merge_edge(
        &self,
        from: &NodeKey,
        relation: &Identifier,
        to: &NodeKey,
    ) -> StoreResult<EdgeKey> {
        self.inner.merge_edge(from, relation, to).await
    }

    async fn set_node_properties(
        &self,
        node: &NodeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()> {
        self.inner.set_node_properties(node, properties).await
    }

    async fn set_edge_properties(
        &self,
        edge: &EdgeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()> {
        self.inner.set_edge_properties(edge, properties).await
    }

    async fn write_batch(&self, groups: &[WriteGroup], domain: &str) -> StoreResult<()> {
        let fail = {
            let mut state = self.state.lock().unwrap();
            let call = state.batch_calls;
            state.batch_calls += 1;
            state.fail_on_call == Some(call)
        };
        if fail {
            return Err(StoreError::Transaction("simulated conflict".to_string()));
        }
        self.inner.write_batch(groups, domain).await
    }

    async fn write_seeds(&self, groups: &[SeedGroup]) -> StoreResult<()> {
        self.inner.write_seeds(groups).await
    }

    async fn create_index(&self, label: &Identifier, property: &str) -> StoreResult<bool> {
        if self.state.lock().unwrap().failing_index.as_deref() == Some(label.as_str()) {
            return Err(StoreError::Schema(format!("cannot index {}", label)));
        }
        self.inner.create_index(label, property).await
    }

    async fn clear_round(&self, limit: usize) -> StoreResult<usize> {
        self.inner.clear_round(limit).await
    }

    async fn count_nodes_by_label(&self) -> StoreResult<Vec<CountEntry>> {
        self.check_read()?;
        self.inner.count_nodes_by_label().await
    }

    async fn count_edges_by_type(&self) -> StoreResult<Vec<CountEntry>> {
        self.check_read()?;
        self.inner.count_edges_by_type().await
    }

    async fn count_edges_by_domain(&self) -> StoreResult<Vec<CountEntry>> {
        self.check_read()?;
        self.inner.count_edges_by_domain().await
    }

    async fn count_nodes_by_domain(&self) -> StoreResult<Vec<CountEntry>> {
        self.check_read()?;
        self.inner.count_nodes_by_domain().await
    }

    async fn edge_summaries(&self, limit: Option<usize>) -> StoreResult<Vec<EdgeSummary>> {
        self.check_read()?;
        self.inner.edge_summaries(limit).await
    }

    async fn node_names(&self, limit: Option<usize>) -> StoreResult<Vec<String>> {
        self.inner.node_names(limit).await
    }

    async fn neighbors(&self, name: &str) -> StoreResult<Vec<NeighborTriple>> {
        self.inner.neighbors(name).await
    }
}
