//! # Triplex SurrealDB Backend
//!
//! [`GraphStore`](triplex_core::GraphStore) implementation on embedded
//! SurrealDB, either in memory or persisted with RocksDB.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use triplex_config::StoreConfig;
//! use triplex_core::GraphStore;
//! use triplex_surrealdb::SurrealGraphStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), triplex_core::StoreError> {
//!     let store = SurrealGraphStore::connect(&StoreConfig::default()).await?;
//!     for entry in store.count_nodes_by_label().await? {
//!         println!("{}: {}", entry.key, entry.count);
//!     }
//!     Ok(())
//! }
//! ```

pub mod graph_store;
pub mod statements;
pub mod surreal_client;

pub use graph_store::SurrealGraphStore;
pub use surreal_client::SurrealClient;
