//! Clear Command - bounded deletion of the whole graph

use anyhow::{Context, Result};
use triplex_config::TriplexConfig;
use triplex_pipeline::clear_store;

use crate::{factories, output};

/// Execute the clear command
pub async fn execute(config: TriplexConfig, chunk: Option<usize>) -> Result<()> {
    let chunk = chunk.unwrap_or(config.pipeline.clear_chunk_size);
    let store = factories::create_store(&config.store).await?;

    output::info(&format!("Clearing graph, {} nodes per round...", chunk));
    let report = clear_store(store.as_ref(), chunk)
        .await
        .context("Failed to clear graph")?;

    output::success(&format!(
        "Deleted {} nodes in {} rounds",
        report.total,
        report.rounds.len()
    ));
    Ok(())
}
