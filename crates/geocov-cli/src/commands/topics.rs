//! Topics command - list the built-in topic registry.

use colored::Colorize;
use geocov::TopicRegistry;

pub fn run(json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = TopicRegistry::builtin();

    if json_output {
        let topics: Vec<_> = registry
            .topics()
            .map(|t| serde_json::json!({ "name": t.name(), "pattern": t.pattern() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&topics)?);
        return Ok(());
    }

    println!("{}", "Built-in topics:".yellow().bold());
    for topic in registry.topics() {
        println!("  {:12} {}", topic.name().white().bold(), topic.pattern().cyan());
    }
    println!();
    println!(
        "Patterns match case-insensitively. Add more under {} in the config.",
        "custom_topics".cyan()
    );

    Ok(())
}
