//! Pipeline Orchestration Layer
//!
//! This crate drives one ingestion run from JSON files on disk to a
//! populated [`GraphStore`](triplex_core::GraphStore).
//!
//! ## Architecture
//!
//! The run coordinates six phases:
//! 1. **Load**: Read every domain directory and the seed directory
//! 2. **Dedupe**: Collapse records that state the same fact, per domain
//! 3. **Clear**: Optionally empty the store in bounded rounds
//! 4. **Index**: Provision the name index for configured and observed labels
//! 5. **Write**: Import seeds, then write each domain in transactional batches
//! 6. **Verify**: Aggregate counts and cross-domain links into a report
//!
//! ## Clear Separation of Concerns
//!
//! Infrastructure crates (DO NOT orchestrate):
//! - `triplex-core`: Record shapes, dedup, planning and the store trait
//! - `triplex-surrealdb`: Just provides storage operations
//!
//! This crate (triplex-pipeline):
//! - Runs the phases in the right order
//! - Decides which failures are per-file (skipped) and which abort the run
//! - Provides single interface for UI layers (CLI, tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use triplex_pipeline::{load_input, CancelFlag, RunController, RunOptions};
//!
//! let input = load_input(&config.sources, (&config.pipeline).into());
//! let controller = RunController::new(store, RunOptions::from(&config));
//! let report = controller.run(input, &CancelFlag::new()).await?;
//! ```

pub mod clear;
pub mod controller;
pub mod error;
pub mod loader;
pub mod seeds;
pub mod verify;
pub mod writer;

pub use clear::{clear_store, ClearReport};
pub use controller::{
    load_input, CancelFlag, DedupSummary, DomainInput, DomainRunReport, LoadedInput, NoopObserver,
    RunController, RunObserver, RunOptions, RunPhase, RunReport,
};
pub use error::{LoadError, PipelineError, PipelineResult};
pub use loader::{
    json_files, load_domain, load_seeds, read_records, DomainRecords, LoadReport, SkippedFile,
    SEED_DOMAIN,
};
pub use seeds::{import_seeds, SeedReport};
pub use verify::{cross_domain_links, verify, CrossDomainLink, VerifyReport};
pub use writer::{BatchWriter, WriteReport};
