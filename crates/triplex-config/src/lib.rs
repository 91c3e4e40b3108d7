//! # Triplex Configuration Library
//!
//! Type-safe configuration for the Triplex ingestion pipeline. A single TOML
//! file describes where the graph store lives, which domain directories feed
//! the run, and how batching, deduplication, index provisioning and
//! verification behave.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use triplex_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load_from_file("triplex.toml").await?;
//!     config.validate()?;
//!     println!("batch size: {}", config.pipeline.batch_size);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod loader;

pub use config::*;
pub use loader::*;
