//! Graph store abstraction
//!
//! [`GraphStore`] is the seam between the pipeline and a storage backend.
//! The primitives (`merge_node`, `merge_edge`, `set_*_properties`) define the
//! get-or-create protocol; `write_batch` and `write_seeds` compose them into
//! one transactional unit per call. Backends are expected to override the
//! composite operations with a native transaction, the provided defaults only
//! chain the primitives.
//!
//! Use `SurrealGraphStore` (in `triplex-surrealdb`) for real runs and
//! [`InMemoryGraphStore`] for tests.

mod memory;

pub use memory::{InMemoryGraphStore, NodeData};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::flatten::FlatProperties;
use crate::identifier::{Identifier, IdentifierError};
use crate::plan::{SeedGroup, WriteGroup};

/// Errors raised by graph store operations
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Identity of a node: (label, normalized name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeKey {
    pub label: Identifier,
    pub name: String,
}

impl NodeKey {
    pub fn new(label: Identifier, name: impl Into<String>) -> Self {
        Self {
            label,
            name: name.into(),
        }
    }
}

/// Identity of an edge: (source node, relation, target node)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeKey {
    pub from: NodeKey,
    pub relation: Identifier,
    pub to: NodeKey,
}

/// One row of an aggregate count
///
/// `key` is the label, relation type or domain being counted; elements that
/// carry no domain are counted under the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub key: String,
    pub count: usize,
}

impl CountEntry {
    pub fn new(key: impl Into<String>, count: usize) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Flat description of one stored edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeSummary {
    pub head: String,
    pub head_label: String,
    pub relation: String,
    pub tail: String,
    pub tail_label: String,
    pub source_domain: Option<String>,
}

/// A one-hop (head, relation, tail) triple
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct NeighborTriple {
    pub head: String,
    pub relation: String,
    pub tail: String,
}

/// Property graph storage used by the ingestion pipeline
///
/// # Method Categories
///
/// - **Primitives**: `merge_node`, `merge_edge`, `set_node_properties`, `set_edge_properties`
/// - **Batches**: `write_batch`, `write_seeds`
/// - **Schema**: `create_index`
/// - **Maintenance**: `clear_round`
/// - **Reads**: `count_*`, `edge_summaries`, `node_names`, `neighbors`
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Get or create the node keyed by `(label, name)`.
    ///
    /// `domain` is recorded only when the node is created; an existing node
    /// keeps the domain of its first writer.
    async fn merge_node(
        &self,
        label: &Identifier,
        name: &str,
        domain: Option<&str>,
    ) -> StoreResult<NodeKey>;

    /// Get or create the edge `from -[relation]-> to`.
    ///
    /// Both endpoints must already exist.
    async fn merge_edge(
        &self,
        from: &NodeKey,
        relation: &Identifier,
        to: &NodeKey,
    ) -> StoreResult<EdgeKey>;

    /// Set each given property on a node, overwriting per key.
    async fn set_node_properties(
        &self,
        node: &NodeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()>;

    /// Set each given property on an edge, overwriting per key.
    async fn set_edge_properties(
        &self,
        edge: &EdgeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()>;

    /// Apply one planned batch.
    ///
    /// For every row: merge both endpoint nodes (stamping `domain` on
    /// creation), merge the edge, then set the row's properties on it.
    /// Running the same batch twice leaves the store unchanged the second
    /// time.
    async fn write_batch(&self, groups: &[WriteGroup], domain: &str) -> StoreResult<()> {
        for group in groups {
            for row in &group.rows {
                let from = self
                    .merge_node(&group.subject_label, &row.subject, Some(domain))
                    .await?;
                let to = self
                    .merge_node(&group.object_label, &row.object, Some(domain))
                    .await?;
                let edge = self.merge_edge(&from, &group.relation, &to).await?;
                self.set_edge_properties(&edge, &row.properties).await?;
            }
        }
        Ok(())
    }

    /// Apply seed groups: merge each node and set its attributes.
    async fn write_seeds(&self, groups: &[SeedGroup]) -> StoreResult<()> {
        for group in groups {
            for row in &group.rows {
                let node = self.merge_node(&group.label, &row.name, None).await?;
                self.set_node_properties(&node, &row.properties).await?;
            }
        }
        Ok(())
    }

    /// Ensure an index on `label.property` exists.
    ///
    /// Returns `true` when the index was created by this call.
    async fn create_index(&self, label: &Identifier, property: &str) -> StoreResult<bool>;

    /// Delete up to `limit` nodes together with their incident edges.
    ///
    /// Returns the number of nodes deleted; zero means the store is empty.
    async fn clear_round(&self, limit: usize) -> StoreResult<usize>;

    /// Node counts per label, largest first
    async fn count_nodes_by_label(&self) -> StoreResult<Vec<CountEntry>>;

    /// Edge counts per relation type, largest first
    async fn count_edges_by_type(&self) -> StoreResult<Vec<CountEntry>>;

    /// Edge counts per `source_domain` property, largest first
    async fn count_edges_by_domain(&self) -> StoreResult<Vec<CountEntry>>;

    /// Node counts per recorded home domain, largest first
    async fn count_nodes_by_domain(&self) -> StoreResult<Vec<CountEntry>>;

    /// Stored edges, up to `limit` when given
    async fn edge_summaries(&self, limit: Option<usize>) -> StoreResult<Vec<EdgeSummary>>;

    /// Distinct node names in ascending order, up to `limit` when given
    async fn node_names(&self, limit: Option<usize>) -> StoreResult<Vec<String>>;

    /// All edges whose head or tail is named `name`
    async fn neighbors(&self, name: &str) -> StoreResult<Vec<NeighborTriple>>;
}

/// Sort counts largest first, ties by key
pub fn sort_counts(entries: &mut [CountEntry]) {
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
}
