//! Convert command - turn a JSONL dump into a lean raw CSV.

use std::path::PathBuf;

use colored::Colorize;

pub fn run(input: PathBuf, output: PathBuf, _verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("File not found: {}", input.display()).into());
    }
    if output.exists() {
        return Err(format!("Refusing to overwrite {}", output.display()).into());
    }

    println!(
        "{} {}",
        "Converting".cyan().bold(),
        input.display().to_string().white()
    );

    let report = geocov::convert_jsonl(&input, &output)?;

    println!(
        "Wrote {} rows from {} lines ({} skipped)",
        report.rows_written.to_string().white().bold(),
        report.lines_read,
        report.lines_skipped.to_string().yellow()
    );
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output.display().to_string().white()
    );
    println!(
        "Add it to a config batch with {}",
        "\"layout\": \"lean\"".cyan()
    );

    Ok(())
}
