//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Geocov: prune and annotate pandemic-era post exports
#[derive(Parser)]
#[command(name = "geocov")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline described by a configuration file
    Run {
        /// Path to the pipeline configuration (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Run the prune stage (overrides the configuration)
        #[arg(long, overrides_with = "no_prune")]
        prune: bool,

        /// Skip the prune stage
        #[arg(long, overrides_with = "prune")]
        no_prune: bool,

        /// Run the annotation stage (overrides the configuration)
        #[arg(long, overrides_with = "no_annotate")]
        annotate: bool,

        /// Skip the annotation stage
        #[arg(long, overrides_with = "annotate")]
        no_annotate: bool,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a JSONL post dump into a lean raw CSV
    Convert {
        /// Input file with one JSON post per line
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output CSV path (must not exist)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// List the built-in topics
    Topics {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Collapse a `--flag/--no-flag` pair into an optional override.
pub fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
