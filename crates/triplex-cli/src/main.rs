use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use triplex_cli::cli::{Cli, Commands};
use triplex_cli::{commands, config};

const LOG_TARGETS: [&str; 4] = [
    "triplex_cli",
    "triplex_core",
    "triplex_pipeline",
    "triplex_surrealdb",
];

/// `RUST_LOG` wins over the CLI level when set
fn init_logging(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<String> = LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect();
        EnvFilter::new(directives.join(","))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.effective_log_level().into());

    let config = config::load(&cli.global).await?;
    debug!("Effective store path: {}", config.store.path);

    match cli.command {
        Commands::Run { dry_run, format } => commands::run::execute(config, dry_run, format).await?,

        Commands::Clear { chunk } => commands::clear::execute(config, chunk).await?,

        Commands::Verify {
            format,
            sample_limit,
        } => commands::verify::execute(config, format, sample_limit).await?,

        Commands::Neighbors { name, suggestions } => {
            commands::neighbors::execute(config, name, suggestions).await?
        }

        Commands::Config { format } => commands::config::execute(config, format)?,
    }

    Ok(())
}
