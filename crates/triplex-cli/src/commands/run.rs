//! Run Command - full ingestion
//!
//! ```text
//! load + dedupe -> clear -> indexes -> seeds -> domains -> verify
//! ```
//!
//! Loading runs on the blocking pool; Ctrl-C stops the run before the next
//! batch. Batches already committed stay in the store.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use triplex_config::TriplexConfig;
use triplex_core::{DedupOptions, GraphStore};
use triplex_pipeline::{
    load_input, CancelFlag, NoopObserver, PipelineError, RunController, RunObserver, RunOptions,
    RunReport,
};

use crate::cli::OutputFormat;
use crate::progress::ProgressObserver;
use crate::{factories, output};

/// Execute the run command
pub async fn execute(config: TriplexConfig, dry_run: bool, format: OutputFormat) -> Result<()> {
    let store: Arc<dyn GraphStore> = if dry_run {
        output::info("Dry run: writing into a temporary in-memory graph");
        factories::create_dry_run_store()
    } else {
        factories::create_store(&config.store).await?
    };

    let cancel = CancelFlag::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current batch");
                cancel.cancel();
            }
        })
    };

    let observer: Arc<dyn RunObserver> = match format {
        OutputFormat::Table => Arc::new(ProgressObserver::new()),
        OutputFormat::Json => Arc::new(NoopObserver),
    };
    let result = run_pipeline(&config, store, observer, &cancel).await;
    ctrl_c.abort();

    let report = result?;
    match format {
        OutputFormat::Table => output::print_run_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

/// Load every domain from `config.sources` and write it into `store`.
pub async fn run_pipeline(
    config: &TriplexConfig,
    store: Arc<dyn GraphStore>,
    observer: Arc<dyn RunObserver>,
    cancel: &CancelFlag,
) -> Result<RunReport> {
    let sources = config.sources.clone();
    let dedup = DedupOptions::from(&config.pipeline);
    info!(
        "Loading {} domains from {}",
        sources.domains.len(),
        sources.base_dir.display()
    );
    let input = tokio::task::spawn_blocking(move || load_input(&sources, dedup))
        .await
        .context("Loading task failed")?;

    let controller =
        RunController::new(store, RunOptions::from(config)).with_observer(observer);
    match controller.run(input, cancel).await {
        Ok(report) => Ok(report),
        Err(e @ PipelineError::Cancelled { .. }) => {
            Err(anyhow::Error::new(e).context("Run cancelled; committed batches were kept"))
        }
        Err(e) => Err(anyhow::Error::new(e).context("Run failed")),
    }
}
