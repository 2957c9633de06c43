use crate::cli::{GlobalArgs, OutputFormat, StatsArgs};
use crate::commands::output::print_stats_summary;
use crate::commands::parse::{expand_globs, parse_source, resolve_config};
use crate::{FixMessage, ParallelParser, ParsingStatistics};
use colored::*;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize)]
struct StatsOutput<'a> {
    files: usize,
    statistics: &'a ParsingStatistics,
    top_tags: Vec<(&'a str, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count_by: Option<CountBy<'a>>,
}

#[derive(Serialize)]
struct CountBy<'a> {
    tag: &'a str,
    values: Vec<(&'a str, usize)>,
}

pub fn run_stats(args: StatsArgs, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(global, &args.separators)?;
    let parser = ParallelParser::from_parser_config(&config)?;

    let files = expand_globs(&args.files)?;
    if files.is_empty() {
        eprintln!("No files matched the given patterns");
        return Ok(());
    }

    let mut statistics = ParsingStatistics::new();
    let mut value_counts: HashMap<String, usize> = HashMap::new();

    for file_path in &files {
        let (_, report) = parse_source(&parser, file_path)?;
        statistics.merge(&report.statistics);

        if let Some(ref tag) = args.count_by {
            for parsed in &report.messages {
                count_value(&mut value_counts, &parsed.message, tag);
            }
        }
    }

    let count_by = args.count_by.as_deref().map(|tag| CountBy {
        tag,
        values: top_values(&value_counts, args.top),
    });

    match args.format {
        OutputFormat::Json => {
            let output = StatsOutput {
                files: files.len(),
                statistics: &statistics,
                top_tags: statistics.top_tags(args.top),
                count_by,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            print_stats_summary(&statistics);
            print_top_tags(&statistics, args.top);
            if let Some(count_by) = count_by {
                print_count_by(&count_by, statistics.parsed_messages);
            }
        }
    }

    Ok(())
}

/// Count one message under the value of its first `tag` field
fn count_value(counts: &mut HashMap<String, usize>, message: &FixMessage, tag: &str) {
    if let Some(value) = message.get(tag) {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
}

fn top_values(counts: &HashMap<String, usize>, limit: usize) -> Vec<(&str, usize)> {
    let mut sorted: Vec<(&str, usize)> = counts.iter().map(|(v, c)| (v.as_str(), *c)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted.truncate(limit);
    sorted
}

fn print_top_tags(statistics: &ParsingStatistics, top: usize) {
    let tags = statistics.top_tags(top);
    if tags.is_empty() {
        return;
    }

    println!("\n{}:", "Tag Distribution".cyan().bold());
    let max_count = tags.iter().map(|(_, c)| *c).max().unwrap_or(1);
    for (tag, count) in tags {
        let bar_len = (count as f64 / max_count as f64 * 40.0) as usize;
        println!("  {:>8} {:>8} {}", tag, count, "█".repeat(bar_len).green());
    }
}

fn print_count_by(count_by: &CountBy<'_>, total: usize) {
    println!("\n{} by tag {}:", "Count".cyan().bold(), count_by.tag);
    if count_by.values.is_empty() {
        println!("  {}", "(no messages carry this tag)".dimmed());
        return;
    }

    for (value, count) in &count_by.values {
        let share = if total == 0 { 0.0 } else { *count as f64 / total as f64 * 100.0 };
        println!("  {:30} {:>8} ({:5.1}%)", value, count, share);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_value_uses_first_occurrence() {
        let mut message = FixMessage::new();
        message.add_tag("35", "D").add_tag("35", "8");

        let mut counts = HashMap::new();
        count_value(&mut counts, &message, "35");
        count_value(&mut counts, &message, "35");
        count_value(&mut counts, &message, "49");

        assert_eq!(counts.len(), 1);
        assert_eq!(counts["D"], 2);
    }

    #[test]
    fn test_top_values_ordering() {
        let counts: HashMap<String, usize> = [("D", 3), ("8", 5), ("0", 3), ("A", 1)]
            .iter()
            .map(|(v, c)| (v.to_string(), *c))
            .collect();

        let top = top_values(&counts, 3);
        assert_eq!(top, vec![("8", 5), ("0", 3), ("D", 3)]);
    }

    #[test]
    fn test_json_output_shape() {
        let mut statistics = ParsingStatistics::new();
        statistics.total_lines = 2;
        statistics.tag_distribution.insert("35".to_string(), 2);

        let output = StatsOutput {
            files: 1,
            statistics: &statistics,
            top_tags: statistics.top_tags(5),
            count_by: None,
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["files"], 1);
        assert_eq!(value["statistics"]["total_lines"], 2);
        assert_eq!(value["top_tags"][0][0], "35");
        assert!(value.get("count_by").is_none());
    }
}
