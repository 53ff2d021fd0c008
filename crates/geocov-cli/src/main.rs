//! Geocov CLI - prune and annotate social-media post exports.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            prune,
            no_prune,
            annotate,
            no_annotate,
            json,
        } => commands::run::run(
            config,
            cli::switch(prune, no_prune),
            cli::switch(annotate, no_annotate),
            json,
            cli.verbose,
        ),

        Commands::Convert { input, output } => commands::convert::run(input, output, cli.verbose),

        Commands::Topics { json } => commands::topics::run(json),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Log to stderr so `--json` output stays machine readable. `RUST_LOG` wins.
fn init_logging(verbose: bool) {
    let level = if verbose { "geocov=debug" } else { "geocov=info" };
    let filter = match level.parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
