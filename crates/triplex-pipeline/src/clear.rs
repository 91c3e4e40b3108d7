//! Bounded store clearing

use serde::Serialize;
use tracing::{debug, info};
use triplex_core::GraphStore;

use crate::error::{PipelineError, PipelineResult};

/// Nodes deleted per round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    /// Deletions of every round that removed something
    pub rounds: Vec<usize>,
    pub total: usize,
}

/// Delete every node and edge, at most `chunk` nodes per round.
///
/// Stops at the first round that deletes nothing.
pub async fn clear_store(store: &dyn GraphStore, chunk: usize) -> PipelineResult<ClearReport> {
    let chunk = chunk.max(1);
    let mut report = ClearReport::default();

    loop {
        let round = report.rounds.len() + 1;
        let deleted = store
            .clear_round(chunk)
            .await
            .map_err(|source| PipelineError::Clear { round, source })?;
        if deleted == 0 {
            break;
        }
        debug!("Clearing round {} deleted {} nodes", round, deleted);
        report.rounds.push(deleted);
        report.total += deleted;
    }

    info!(
        "Cleared {} nodes in {} rounds",
        report.total,
        report.rounds.len()
    );
    Ok(report)
}
