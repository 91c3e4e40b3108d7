//! Run Controller
//!
//! Strictly linear state machine:
//!
//! ```text
//! load + dedupe (parallel per domain)
//!   -> clear (optional) -> indexes -> seeds -> domains in order -> verify
//! ```
//!
//! Loading is pure computation and runs on the rayon pool. Everything that
//! touches the store runs sequentially through one [`GraphStore`] so that a
//! node's home domain is decided by configured domain order.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use triplex_config::{SourcesConfig, TriplexConfig, DEFAULT_INDEX_LABELS};
use triplex_core::{
    deduplicate, DedupOptions, DedupReport, GraphStore, Identifier, Seed, Triplet,
};

use crate::clear::{clear_store, ClearReport};
use crate::error::PipelineResult;
use crate::loader::{load_domain, load_seeds, LoadReport};
use crate::seeds::{import_seeds, SeedReport};
use crate::verify::{verify, VerifyReport};
use crate::writer::{BatchWriter, WriteReport};

/// Shared cancellation switch
///
/// Cloning shares the flag. The controller checks it before every batch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Phases reported to a [`RunObserver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    Clearing,
    Indexing { labels: usize },
    Seeding { seeds: usize },
    Writing { domain: String, batches: usize },
    Verifying,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Clearing => write!(f, "Clearing store"),
            RunPhase::Indexing { labels } => write!(f, "Provisioning {} indexes", labels),
            RunPhase::Seeding { seeds } => write!(f, "Importing {} seeds", seeds),
            RunPhase::Writing { domain, batches } => {
                write!(f, "Writing domain '{}' ({} batches)", domain, batches)
            }
            RunPhase::Verifying => write!(f, "Verifying"),
        }
    }
}

/// Progress callbacks; every method defaults to doing nothing
pub trait RunObserver: Send + Sync {
    fn on_phase(&self, _phase: &RunPhase) {}

    fn on_batch_written(
        &self,
        _domain: &str,
        _batch_index: usize,
        _total_batches: usize,
        _rows: usize,
    ) {
    }
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub batch_size: usize,
    pub clear_before_load: bool,
    pub clear_chunk_size: usize,
    pub index_labels: Vec<String>,
    pub index_property: String,
    pub include_observed_labels: bool,
    pub verify: bool,
    pub sample_limit: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            clear_before_load: true,
            clear_chunk_size: 10_000,
            index_labels: DEFAULT_INDEX_LABELS.iter().map(|s| s.to_string()).collect(),
            index_property: "name".to_string(),
            include_observed_labels: true,
            verify: true,
            sample_limit: 5,
        }
    }
}

impl From<&TriplexConfig> for RunOptions {
    fn from(config: &TriplexConfig) -> Self {
        Self {
            batch_size: config.pipeline.batch_size,
            clear_before_load: config.pipeline.clear_before_load,
            clear_chunk_size: config.pipeline.clear_chunk_size,
            index_labels: config.indexes.labels.clone(),
            index_property: config.indexes.property.clone(),
            include_observed_labels: config.indexes.include_observed,
            verify: config.verify.enabled,
            sample_limit: config.verify.sample_limit,
        }
    }
}

/// One domain after load and deduplication
#[derive(Debug, Clone, Default)]
pub struct DomainInput {
    pub domain: String,
    pub records: Vec<Triplet>,
    pub load: LoadReport,
    pub dedup: DedupReport,
}

/// Everything a run writes
#[derive(Debug, Clone, Default)]
pub struct LoadedInput {
    pub domains: Vec<DomainInput>,
    pub seeds: Vec<Seed>,
    pub seed_load: Option<LoadReport>,
}

impl LoadedInput {
    /// Labels used by the records and seeds, in first-seen order
    pub fn observed_labels(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut labels = Vec::new();
        let record_labels = self
            .domains
            .iter()
            .flat_map(|d| d.records.iter())
            .flat_map(|r| [r.subject_type(), r.object_type()]);
        let seed_labels = self.seeds.iter().map(|s| s.label());

        for label in record_labels.chain(seed_labels) {
            if seen.insert(label.to_string()) {
                labels.push(label.to_string());
            }
        }
        labels
    }

    pub fn record_count(&self) -> usize {
        self.domains.iter().map(|d| d.records.len()).sum()
    }
}

/// Load and deduplicate every configured domain plus seeds.
///
/// Domains are processed in parallel; the result keeps configured order.
pub fn load_input(sources: &SourcesConfig, dedup: DedupOptions) -> LoadedInput {
    let domains: Vec<DomainInput> = sources
        .domains
        .par_iter()
        .map(|source| {
            let dir = sources.domain_dir(source);
            let loaded = load_domain(&source.name, &dir);
            let deduped = deduplicate(loaded.records, dedup);
            info!(
                "Domain '{}': {} records loaded, {} after dedup ({} duplicates, {} rejected)",
                source.name,
                deduped.report.input,
                deduped.report.output,
                deduped.report.removed,
                deduped.report.rejected
            );
            DomainInput {
                domain: source.name.clone(),
                records: deduped.records,
                load: loaded.report,
                dedup: deduped.report,
            }
        })
        .collect();

    let (seeds, seed_load) = match sources.seed_path() {
        Some(dir) => {
            let (seeds, report) = load_seeds(&dir);
            (seeds, Some(report))
        }
        None => (Vec::new(), None),
    };

    LoadedInput {
        domains,
        seeds,
        seed_load,
    }
}

/// Per-domain summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRunReport {
    pub domain: String,
    pub load: LoadReport,
    pub dedup: DedupSummary,
    pub write: WriteReport,
}

/// Serializable copy of [`DedupReport`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupSummary {
    pub input: usize,
    pub output: usize,
    pub removed: usize,
    pub rejected: usize,
}

impl From<DedupReport> for DedupSummary {
    fn from(report: DedupReport) -> Self {
        Self {
            input: report.input,
            output: report.output,
            removed: report.removed,
            rejected: report.rejected,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cleared: Option<ClearReport>,
    pub indexes_requested: usize,
    pub indexes_created: usize,
    /// Labels whose index could not be created; the run carries on without them
    pub indexes_failed: Vec<String>,
    pub seeds: Option<SeedReport>,
    pub domains: Vec<DomainRunReport>,
    pub verify: Option<VerifyReport>,
}

impl RunReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn rows_written(&self) -> usize {
        self.domains.iter().map(|d| d.write.rows).sum()
    }
}

/// Drives one run against a store
///
/// # Architecture
///
/// ```text
/// RunController (orchestration)
///   ├─> clear_store    (bounded rounds)
///   ├─> create_index   (configured + observed labels)
///   ├─> import_seeds   (one transaction)
///   ├─> BatchWriter    (one transaction per batch, domains in order)
///   └─> verify         (read-only report)
/// ```
pub struct RunController {
    store: Arc<dyn GraphStore>,
    options: RunOptions,
    observer: Arc<dyn RunObserver>,
}

impl RunController {
    pub fn new(store: Arc<dyn GraphStore>, options: RunOptions) -> Self {
        Self {
            store,
            options,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Write `input` to the store.
    ///
    /// Returns at the first fatal error; batches committed before it remain.
    /// Index failures are not fatal and are listed in the report.
    pub async fn run(&self, input: LoadedInput, cancel: &CancelFlag) -> PipelineResult<RunReport> {
        let started_at = Utc::now();
        info!(
            "Starting run: {} domains, {} records, {} seeds",
            input.domains.len(),
            input.record_count(),
            input.seeds.len()
        );

        let cleared = if self.options.clear_before_load {
            self.observer.on_phase(&RunPhase::Clearing);
            Some(clear_store(self.store.as_ref(), self.options.clear_chunk_size).await?)
        } else {
            None
        };

        let labels = self.index_labels(&input);
        self.observer.on_phase(&RunPhase::Indexing {
            labels: labels.len(),
        });
        let mut indexes_created = 0;
        let mut indexes_failed = Vec::new();
        for label in &labels {
            match self
                .store
                .create_index(label, &self.options.index_property)
                .await
            {
                Ok(true) => indexes_created += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        "Could not index {}.{}: {}",
                        label, self.options.index_property, e
                    );
                    indexes_failed.push(label.to_string());
                }
            }
        }

        let seeds = if input.seeds.is_empty() {
            None
        } else {
            self.observer.on_phase(&RunPhase::Seeding {
                seeds: input.seeds.len(),
            });
            Some(import_seeds(self.store.as_ref(), &input.seeds).await?)
        };

        let writer = BatchWriter::new(Arc::clone(&self.store), self.options.batch_size);
        let mut domains = Vec::with_capacity(input.domains.len());
        for domain in input.domains {
            self.observer.on_phase(&RunPhase::Writing {
                domain: domain.domain.clone(),
                batches: writer.batch_count(domain.records.len()),
            });
            let write = writer
                .write_domain(
                    &domain.domain,
                    &domain.records,
                    cancel,
                    self.observer.as_ref(),
                )
                .await?;
            domains.push(DomainRunReport {
                domain: domain.domain,
                load: domain.load,
                dedup: domain.dedup.into(),
                write,
            });
        }

        let verify_report = if self.options.verify {
            self.observer.on_phase(&RunPhase::Verifying);
            Some(verify(self.store.as_ref(), self.options.sample_limit).await)
        } else {
            None
        };

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            cleared,
            indexes_requested: labels.len(),
            indexes_created,
            indexes_failed,
            seeds,
            domains,
            verify: verify_report,
        };
        info!(
            "Run finished in {}ms: {} rows written",
            report.duration().num_milliseconds(),
            report.rows_written()
        );
        Ok(report)
    }

    /// Configured labels followed by observed ones, sanitized and distinct
    fn index_labels(&self, input: &LoadedInput) -> Vec<Identifier> {
        let mut candidates = self.options.index_labels.clone();
        if self.options.include_observed_labels {
            candidates.extend(input.observed_labels());
        }

        let mut seen = BTreeSet::new();
        let mut labels = Vec::new();
        for raw in candidates {
            match Identifier::sanitize(&raw) {
                Ok(label) => {
                    if seen.insert(label.clone()) {
                        labels.push(label);
                    }
                }
                Err(e) => warn!("Not indexing label {:?}: {}", raw, e),
            }
        }
        labels
    }
}
