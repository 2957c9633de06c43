use crate::cli::{GlobalArgs, ParseArgs, SeparatorArgs};
use crate::commands::output::{print_stats_summary, OutputFormatter, SourcedMessage};
use crate::config::{NormalizerConfig, ParserConfig};
use crate::separator::{unescape, SeparatorMode};
use crate::{FixError, FixMessage, ParallelParser, ParseReport, ParsingStatistics};
use glob::glob;
use std::collections::HashMap;
use std::fs::File;
use std::io::{stdin, stdout, Read, Write};
use std::path::{Path, PathBuf};

/// Session-level MsgType (tag 35) values hidden by `--hide-admin`
const ADMIN_MSG_TYPES: [&str; 7] = ["0", "1", "2", "3", "4", "5", "A"];

pub fn run_parse(args: ParseArgs, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(global, &args.separators)?;
    let parser = ParallelParser::from_parser_config(&config)?;
    let formatter = OutputFormatter::new(args.format).with_fields(args.fields.clone());

    let files = expand_globs(&args.files)?;
    if files.is_empty() {
        eprintln!("No files matched the given patterns");
        return Ok(());
    }

    let field_filters = parse_field_filters(&args.field_filters);
    let (selected, statistics) =
        select_messages(&parser, &files, args.hide_admin, &field_filters, args.limit)?;

    let mut output: Box<dyn Write> = if let Some(ref path) = args.output_file {
        Box::new(File::create(path)?)
    } else {
        Box::new(stdout())
    };
    formatter.write_all(&mut output, &selected)?;
    output.flush()?;

    // Keep stdout clean unless the messages went to a file
    if args.output_file.is_some() {
        print_stats_summary(&statistics);
    }

    Ok(())
}

/// Parse every input and keep the messages that pass the filters.
///
/// `limit` caps the returned messages only; statistics cover every input.
pub fn select_messages(
    parser: &ParallelParser,
    files: &[PathBuf],
    hide_admin: bool,
    field_filters: &HashMap<String, String>,
    limit: Option<usize>,
) -> Result<(Vec<SourcedMessage>, ParsingStatistics), Box<dyn std::error::Error>> {
    let mut statistics = ParsingStatistics::new();
    let mut selected = Vec::new();

    for file_path in files {
        let (source, report) = parse_source(parser, file_path)?;
        statistics.merge(&report.statistics);

        for parsed in report.messages {
            if limit.is_some_and(|limit| selected.len() >= limit) {
                break;
            }
            if matches_filters(&parsed.message, hide_admin, field_filters) {
                selected.push(SourcedMessage { source: source.clone(), parsed });
            }
        }
    }

    Ok((selected, statistics))
}

/// Build the parser config from the config file and command-line overrides
pub fn resolve_config(global: &GlobalArgs, separators: &SeparatorArgs) -> Result<ParserConfig, FixError> {
    let mut config = match &global.config {
        Some(path) => ParserConfig::from_json_file(path)?,
        None => ParserConfig::default(),
    };

    if separators.regex {
        config.separator_mode = SeparatorMode::Pattern;
    }

    // Regex mode understands escapes itself
    let mode = config.separator_mode;
    let expand = |value: &str| match mode {
        SeparatorMode::Literal => unescape(value),
        SeparatorMode::Pattern => value.to_string(),
    };

    if let Some(ref value) = separators.message_separator {
        config.message_separator = expand(value);
    }
    if let Some(ref value) = separators.field_separator {
        config.field_separator = expand(value);
    }
    if let Some(ref value) = separators.tag_value_separator {
        config.tag_value_separator = expand(value);
    }

    if separators.no_strip_timestamps {
        config.normalizer = NormalizerConfig::Passthrough;
    }
    if !separators.strip_prefix.is_empty() {
        let patterns = separators.strip_prefix.clone();
        config.normalizer = if separators.no_strip_timestamps {
            NormalizerConfig::Patterns(patterns)
        } else {
            NormalizerConfig::TimestampThenPatterns(patterns)
        };
    }

    if global.parallel > 0 {
        config.parallel.num_threads = global.parallel;
    }

    Ok(config)
}

/// Read and parse one input. `-` reads standard input.
pub fn parse_source(parser: &ParallelParser, path: &Path) -> Result<(String, ParseReport), Box<dyn std::error::Error>> {
    let (source, text) = if path.as_os_str() == "-" {
        let mut text = String::new();
        stdin().read_to_string(&mut text)?;
        ("<stdin>".to_string(), text)
    } else {
        let text = std::fs::read_to_string(path).map_err(|e| FixError::IoError {
            operation: format!("reading {}", path.display()),
            error_message: e.to_string(),
        })?;
        (path.to_string_lossy().to_string(), text)
    };

    tracing::info!(source = %source, bytes = text.len(), "parsing input");
    let report = parser.parse_report(&text);
    Ok((source, report))
}

pub fn expand_globs(patterns: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern_str = pattern.to_string_lossy();
        if pattern_str.contains('*') || pattern_str.contains('?') {
            for entry in glob(&pattern_str)? {
                files.push(entry?);
            }
        } else {
            files.push(pattern.clone());
        }
    }
    Ok(files)
}

/// Turn `tag=value` filter strings into a map; malformed entries are ignored
pub fn parse_field_filters(filters: &Option<Vec<String>>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(filters) = filters {
        for filter in filters {
            if let Some((tag, value)) = filter.split_once('=') {
                map.insert(tag.trim().to_string(), value.to_string());
            }
        }
    }
    map
}

pub fn is_admin_message(message: &FixMessage) -> bool {
    message
        .get("35")
        .map(|msg_type| ADMIN_MSG_TYPES.contains(&msg_type))
        .unwrap_or(false)
}

pub fn matches_filters(message: &FixMessage, hide_admin: bool, field_filters: &HashMap<String, String>) -> bool {
    if hide_admin && is_admin_message(message) {
        return false;
    }

    // Any occurrence of a repeated tag may satisfy a filter
    field_filters
        .iter()
        .all(|(tag, expected)| message.fields_for(tag).any(|value| value == expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(pairs: &[(&str, &str)]) -> FixMessage {
        let mut message = FixMessage::new();
        for (tag, value) in pairs {
            message.add_tag(tag, value);
        }
        message
    }

    #[test]
    fn test_admin_detection() {
        assert!(is_admin_message(&message(&[("8", "FIX.4.4"), ("35", "0")])));
        assert!(is_admin_message(&message(&[("35", "A")])));
        assert!(!is_admin_message(&message(&[("35", "D")])));
        assert!(!is_admin_message(&message(&[("8", "FIX.4.4")])));
    }

    #[test]
    fn test_field_filters() {
        let filters = parse_field_filters(&Some(vec!["35=D".to_string(), "bogus".to_string()]));
        assert_eq!(filters.len(), 1);

        assert!(matches_filters(&message(&[("35", "D")]), false, &filters));
        assert!(!matches_filters(&message(&[("35", "8")]), false, &filters));
        assert!(matches_filters(&message(&[("35", "8"), ("35", "D")]), false, &filters));
        assert!(!matches_filters(&message(&[("35", "0")]), true, &HashMap::new()));
    }

    #[test]
    fn test_resolve_config_literal_escapes() {
        let separators = SeparatorArgs {
            field_separator: Some(r"\x01".to_string()),
            message_separator: Some(r"\n".to_string()),
            ..Default::default()
        };
        let config = resolve_config(&GlobalArgs::default(), &separators).unwrap();
        assert_eq!(config.field_separator, "\x01");
        assert_eq!(config.message_separator, "\n");
        assert_eq!(config.separator_mode, SeparatorMode::Literal);
    }

    #[test]
    fn test_resolve_config_regex_mode() {
        let separators = SeparatorArgs {
            field_separator: Some(r"\s*\|\s*".to_string()),
            regex: true,
            no_strip_timestamps: true,
            ..Default::default()
        };
        let global = GlobalArgs { parallel: 3, ..Default::default() };
        let config = resolve_config(&global, &separators).unwrap();
        assert_eq!(config.field_separator, r"\s*\|\s*");
        assert_eq!(config.separator_mode, SeparatorMode::Pattern);
        assert_eq!(config.normalizer, NormalizerConfig::Passthrough);
        assert_eq!(config.parallel.num_threads, 3);
    }

    #[test]
    fn test_resolve_config_strip_prefix() {
        let separators = SeparatorArgs {
            strip_prefix: vec!["^OUT ".to_string()],
            ..Default::default()
        };
        let config = resolve_config(&GlobalArgs::default(), &separators).unwrap();
        assert_eq!(
            config.normalizer,
            NormalizerConfig::TimestampThenPatterns(vec!["^OUT ".to_string()])
        );

        let parser = ParallelParser::from_parser_config(&config).unwrap();
        let parsed = parser.parse_log_detailed("20240101-10:00:00.000: OUT 8=FIX\x0135=D");
        assert_eq!(parsed[0].message.get("8"), Some("FIX"));
        assert!(parsed[0].timestamp.is_some());
    }

    #[test]
    fn test_resolve_config_strip_prefix_without_timestamps() {
        let separators = SeparatorArgs {
            strip_prefix: vec!["^OUT ".to_string()],
            no_strip_timestamps: true,
            ..Default::default()
        };
        let config = resolve_config(&GlobalArgs::default(), &separators).unwrap();
        assert_eq!(config.normalizer, NormalizerConfig::Patterns(vec!["^OUT ".to_string()]));
    }

    fn write_log(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_limit_keeps_statistics_for_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_log(&dir, "a.log", "8=FIX|35=D|\n8=FIX|35=8|\n8=FIX|35=0|");
        let second = write_log(&dir, "b.log", "8=FIX|35=D|\nnoise\n8=FIX|35=F|");

        let config = ParserConfig {
            field_separator: "|".to_string(),
            ..Default::default()
        };
        let parser = ParallelParser::from_parser_config(&config).unwrap();

        let (selected, statistics) =
            select_messages(&parser, &[first, second], true, &HashMap::new(), Some(2)).unwrap();

        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|m| m.source.ends_with("a.log")));
        assert_eq!(statistics.total_lines, 6);
        assert_eq!(statistics.parsed_messages, 5);
        assert_eq!(statistics.dropped_lines, 1);
    }

    #[test]
    fn test_select_messages_applies_filters_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_log(&dir, "a.log", "8=FIX|35=D|11=A1|\n8=FIX|35=0|");
        let second = write_log(&dir, "b.log", "8=FIX|35=8|11=A1|\n8=FIX|35=8|11=B2|");

        let config = ParserConfig {
            field_separator: "|".to_string(),
            ..Default::default()
        };
        let parser = ParallelParser::from_parser_config(&config).unwrap();
        let filters = parse_field_filters(&Some(vec!["11=A1".to_string()]));

        let (selected, _) = select_messages(&parser, &[first, second], false, &filters, None).unwrap();
        let lines: Vec<(bool, usize)> = selected
            .iter()
            .map(|m| (m.source.ends_with("b.log"), m.parsed.line_number))
            .collect();
        assert_eq!(lines, vec![(false, 1), (true, 1)]);
    }

    #[test]
    fn test_expand_globs_passes_plain_paths_through() {
        let files = expand_globs(&[PathBuf::from("a.log"), PathBuf::from("-")]).unwrap();
        assert_eq!(files, vec![PathBuf::from("a.log"), PathBuf::from("-")]);
    }

    #[test]
    fn test_parse_source_missing_file() {
        let parser = ParallelParser::from_parser_config(&ParserConfig::default()).unwrap();
        assert!(parse_source(&parser, Path::new("/nonexistent/fix.log")).is_err());
    }
}
