//! Seed Importer

use serde::Serialize;
use tracing::{info, warn};
use triplex_core::{GraphStore, Seed, SeedPlan, StoreError};

use crate::error::{PipelineError, PipelineResult};

/// Counts from one seed import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub written: usize,
    pub skipped: usize,
    pub labels: Vec<String>,
}

/// Write curated seeds in one transaction.
///
/// Each seed becomes (or updates) the node keyed by its label and normalized
/// name, flagged `is_seed = true`.
pub async fn import_seeds(store: &dyn GraphStore, seeds: &[Seed]) -> PipelineResult<SeedReport> {
    let plan = SeedPlan::prepare(seeds).map_err(|e| PipelineError::Seeds {
        source: StoreError::InvalidIdentifier(e),
    })?;

    if plan.skipped > 0 {
        warn!("Skipped {} seeds with an empty name", plan.skipped);
    }

    store
        .write_seeds(&plan.groups)
        .await
        .map_err(|source| PipelineError::Seeds { source })?;

    let report = SeedReport {
        written: plan.row_count(),
        skipped: plan.skipped,
        labels: plan.labels().map(|l| l.to_string()).collect(),
    };
    info!(
        "Imported {} seeds across {} labels",
        report.written,
        report.labels.len()
    );
    Ok(report)
}
