use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages (default)
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Config rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
}

#[derive(Parser)]
#[command(name = "tpx")]
#[command(about = "tpx - load cross-domain triplets into a deduplicated property graph")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/triplex/config.toml)
    #[arg(short = 'C', long, global = true, env = "TRIPLEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database path, or ":memory:" (overrides config file)
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Root directory for domain and seed inputs (overrides config file)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Records per write transaction (overrides config file)
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    /// Keep existing graph contents instead of clearing before a run
    #[arg(long, global = true)]
    pub no_clear: bool,
}

impl GlobalArgs {
    /// Effective log level: explicit level, else debug when verbose, else info
    pub fn effective_log_level(&self) -> LogLevel {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level,
            (None, true) => LogLevel::Debug,
            (None, false) => LogLevel::Info,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load, deduplicate and write every configured domain, then verify
    Run {
        /// Write into a throwaway in-memory graph instead of the configured store
        #[arg(long)]
        dry_run: bool,

        /// Output format for the run report
        #[arg(short = 'f', long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete every node and edge in bounded rounds
    Clear {
        /// Nodes deleted per round (defaults to pipeline.clear_chunk_size)
        #[arg(long)]
        chunk: Option<usize>,
    },

    /// Print structural statistics and cross-domain links
    Verify {
        /// Output format for the report
        #[arg(short = 'f', long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Example rows per section (defaults to verify.sample_limit)
        #[arg(long)]
        sample_limit: Option<usize>,
    },

    /// List one-hop triples around a node name
    Neighbors {
        /// Node name; normalized before lookup
        name: String,

        /// Maximum name suggestions shown when nothing matches
        #[arg(long, default_value = "20")]
        suggestions: usize,
    },

    /// Print the effective configuration
    Config {
        #[arg(short = 'f', long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },
}
