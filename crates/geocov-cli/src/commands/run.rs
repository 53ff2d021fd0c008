//! Run command - execute the prune and annotate stages from a config file.

use std::path::PathBuf;

use colored::Colorize;
use geocov::{AnnotationSummary, BatchOutcome, Pipeline, PipelineConfig, PruneReport};
use geocov::prune::DestinationState;

pub fn run(
    config_path: PathBuf,
    prune: Option<bool>,
    annotate: Option<bool>,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !config_path.exists() {
        return Err(format!("Config file not found: {}", config_path.display()).into());
    }

    let mut config = PipelineConfig::load(&config_path)?;
    if let Some(prune) = prune {
        config.do_prune = prune;
    }
    if let Some(annotate) = annotate {
        config.do_annotate = annotate;
    }
    config.validate()?;

    if !json_output {
        println!(
            "{} {}",
            "Running".cyan().bold(),
            config_path.display().to_string().white()
        );
    }

    let pipeline = Pipeline::with_config(config)?;
    let report = pipeline.run()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(prune) = &report.prune {
        print_prune(prune, verbose);
    }
    if let Some(summary) = &report.annotation {
        print_annotation(summary);
    }
    if report.prune.is_none() && report.annotation.is_none() {
        println!("{}", "Nothing to do: both stages are disabled.".yellow());
    }

    Ok(())
}

fn print_prune(report: &PruneReport, verbose: bool) {
    println!();
    println!(
        "{} {}",
        "Checkpoints in".yellow().bold(),
        report.checkpoint_dir.display()
    );
    match report.destination {
        DestinationState::Created => println!("  Directory created"),
        DestinationState::Empty => {}
        DestinationState::Populated { entries } => println!(
            "  {} directory already held {} entries; existing checkpoints were kept",
            "Warning:".yellow().bold(),
            entries
        ),
    }

    for (key, outcome) in &report.batches {
        match outcome {
            BatchOutcome::Written {
                path,
                stats,
                source,
            } => {
                println!(
                    "  {:12} {} {} rows ({} re-shares dropped, {} rows skipped)",
                    key,
                    "written".green(),
                    stats.rows_out.to_string().white().bold(),
                    stats.reshares_dropped,
                    stats.skipped_rows
                );
                if verbose {
                    println!("  {:12} {} sha256 {}", "", path.display(), source.hash);
                }
            }
            BatchOutcome::Skipped { reason, detail } => {
                println!("  {:12} {} {}", key, "skipped".red(), reason);
                if verbose {
                    println!("  {:12} {}", "", detail.dimmed());
                }
            }
        }
    }

    println!(
        "Pruned {} batches, skipped {}",
        report.written().to_string().green(),
        report.skipped().to_string().red()
    );
}

fn print_annotation(summary: &AnnotationSummary) {
    println!();
    println!("{}", "Annotation:".yellow().bold());

    let topics = summary.topics();
    for (key, counts) in &summary.batches {
        let matches: Vec<String> = topics
            .iter()
            .map(|t| format!("{}={}", t, counts.matches.get(*t).copied().unwrap_or(0)))
            .collect();
        println!("  {:12} {:>8} rows  {}", key, counts.rows, matches.join("  "));
    }
    for (key, message) in &summary.failed {
        println!("  {:12} {} {}", key, "failed".red(), message);
    }

    println!(
        "Total: {} rows",
        summary.total_rows().to_string().white().bold()
    );
    for topic in topics {
        println!(
            "  {:12} {}",
            topic,
            summary.total_matches(topic).to_string().cyan()
        );
    }
}
