//! Batch Writer
//!
//! Splits a domain's deduplicated records into fixed-size batches, plans each
//! batch and hands it to the store as one transactional unit. Batches run
//! strictly in order; the first failure stops the domain.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};
use triplex_core::{GraphStore, Triplet, WritePlan};

use crate::controller::{CancelFlag, RunObserver};
use crate::error::{PipelineError, PipelineResult};

/// Counts for one domain's writes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub batches: usize,
    pub rows: usize,
    pub groups: usize,
}

/// Writes one domain at a time through a [`GraphStore`]
pub struct BatchWriter {
    store: Arc<dyn GraphStore>,
    batch_size: usize,
}

impl BatchWriter {
    /// `batch_size` of zero is treated as one.
    pub fn new(store: Arc<dyn GraphStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_count(&self, records: usize) -> usize {
        records.div_ceil(self.batch_size)
    }

    /// Write all records of `domain`.
    ///
    /// The cancel flag is checked before every batch. Batches committed
    /// before a failure or cancellation stay in the store.
    pub async fn write_domain(
        &self,
        domain: &str,
        records: &[Triplet],
        cancel: &CancelFlag,
        observer: &dyn RunObserver,
    ) -> PipelineResult<WriteReport> {
        let total_batches = self.batch_count(records.len());
        let mut report = WriteReport::default();

        for (batch_index, chunk) in records.chunks(self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                info!(
                    "Cancellation requested, stopping before batch {} of domain '{}'",
                    batch_index, domain
                );
                return Err(PipelineError::Cancelled {
                    domain: domain.to_string(),
                    batch_index,
                });
            }

            let plan =
                WritePlan::prepare(domain, chunk).map_err(|source| PipelineError::Identifier {
                    domain: domain.to_string(),
                    batch_index,
                    source,
                })?;

            debug!(
                "Writing batch {}/{} of domain '{}': {} rows in {} groups",
                batch_index + 1,
                total_batches,
                domain,
                plan.row_count(),
                plan.groups.len()
            );

            if let Err(source) = self.store.write_batch(&plan.groups, domain).await {
                error!(
                    "Batch {} of domain '{}' failed: {}",
                    batch_index, domain, source
                );
                return Err(PipelineError::Batch {
                    domain: domain.to_string(),
                    batch_index,
                    source,
                });
            }

            report.batches += 1;
            report.rows += plan.row_count();
            report.groups += plan.groups.len();
            observer.on_batch_written(domain, batch_index, total_batches, plan.row_count());
        }

        info!(
            "Domain '{}': wrote {} rows in {} batches",
            domain, report.rows, report.batches
        );
        Ok(report)
    }
}
