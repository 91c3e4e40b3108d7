//! # Triplex Core
//!
//! Shared abstractions for the triplet ingestion pipeline.
//!
//! This crate owns everything that is pure computation or pure interface:
//!
//! - [`normalize`]: canonical forms for free text and entity names
//! - [`record`]: the triplet and seed record shapes produced by loaders
//! - [`flatten`]: nested attribute payloads → flat primitive property maps
//! - [`dedup`]: composite-key deduplication ("richest record wins")
//! - [`identifier`]: allow-list sanitization of labels and relationship types
//! - [`plan`]: grouping of a batch by (subject label, object label, relation)
//! - [`store`]: the [`GraphStore`] trait and an in-memory implementation
//! - [`cache`]: a refreshable snapshot of node names for downstream lookups
//!
//! Storage backends implement [`GraphStore`]; the pipeline crate drives them.

pub mod cache;
pub mod dedup;
pub mod flatten;
pub mod identifier;
pub mod normalize;
pub mod plan;
pub mod record;
pub mod store;

pub use cache::NodeNameCache;
pub use dedup::{deduplicate, DedupOptions, DedupReport, Deduplicated};
pub use flatten::{flatten_properties, FlatProperties, PropertyValue, Scalar};
pub use identifier::{Identifier, IdentifierError};
pub use normalize::{coerce_to_string, normalize_name, normalize_text};
pub use plan::{SeedGroup, SeedPlan, SeedRow, WriteGroup, WritePlan, WriteRow};
pub use record::{
    DedupKey, Seed, Triplet, DEFAULT_ENTITY_TYPE, DEFAULT_PREDICATE, DEFAULT_SEED_TYPE,
};
pub use store::{
    CountEntry, EdgeKey, EdgeSummary, GraphStore, InMemoryGraphStore, NeighborTriple, NodeData,
    NodeKey, StoreError, StoreResult,
};
pub use triplex_config::DedupPolicy;
