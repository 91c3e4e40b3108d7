//! Verify Command - read-only structural report

use anyhow::Result;
use triplex_config::TriplexConfig;
use triplex_pipeline::verify;

use crate::cli::OutputFormat;
use crate::{factories, output};

/// Execute the verify command
pub async fn execute(
    config: TriplexConfig,
    format: OutputFormat,
    sample_limit: Option<usize>,
) -> Result<()> {
    let store = factories::create_store(&config.store).await?;
    let limit = sample_limit.unwrap_or(config.verify.sample_limit);
    let report = verify(store.as_ref(), limit).await;

    match format {
        OutputFormat::Table => output::print_verify_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
