//! Pipeline error types
//!
//! [`LoadError`] is per-file and never aborts a run; the loader records it
//! and moves on. [`PipelineError`] aborts the run and carries enough context
//! (domain, batch index, clearing round) to re-run safely.

use std::path::PathBuf;
use thiserror::Error;
use triplex_core::{IdentifierError, StoreError};

/// Failure to read one input file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected document shape in {path}: {message}")]
    Shape { path: PathBuf, message: String },
}

impl LoadError {
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::Io { path, .. }
            | LoadError::Json { path, .. }
            | LoadError::Shape { path, .. } => path,
        }
    }
}

/// Fatal run errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Batch {batch_index} of domain '{domain}' failed: {source}")]
    Batch {
        domain: String,
        batch_index: usize,
        #[source]
        source: StoreError,
    },

    #[error("Batch {batch_index} of domain '{domain}' has an unusable type: {source}")]
    Identifier {
        domain: String,
        batch_index: usize,
        #[source]
        source: IdentifierError,
    },

    #[error("Seed import failed: {source}")]
    Seeds {
        #[source]
        source: StoreError,
    },

    #[error("Clearing round {round} failed: {source}")]
    Clear {
        round: usize,
        #[source]
        source: StoreError,
    },

    #[error("Run cancelled before batch {batch_index} of domain '{domain}'")]
    Cancelled { domain: String, batch_index: usize },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
