//! Triplex CLI library
//!
//! Exposes the `tpx` command-line surface: argument parsing, configuration
//! overrides, store construction, progress rendering and report output.
//! Commands are thin: all ingestion logic lives in `triplex-pipeline`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod factories;
pub mod output;
pub mod progress;
