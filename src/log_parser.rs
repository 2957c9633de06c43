use crate::config::ParserConfig;
use crate::diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
use crate::error::FixError;
use crate::field_parser::{FieldCounts, FieldParser};
use crate::models::{FixMessage, ParsedMessage};
use crate::normalizer::{LineNormalizer, TimestampPrefixNormalizer};
use crate::parse_result::ParseReport;
use crate::separator::{Separator, Separators};
use crate::statistics::ParsingStatistics;
use std::sync::Arc;
use std::time::Instant;

/// What one source line turned into
pub(crate) enum LineOutcome {
    Message(ParsedMessage, FieldCounts),
    Dropped,
}

/// Splits a log into lines, normalizes each one and parses its fields.
///
/// Lines are independent of each other: no state is carried from one line
/// to the next, so the same input always gives the same output.
pub struct FixLogParser {
    message_separator: Separator,
    field_parser: FieldParser,
    normalizer: Box<dyn LineNormalizer>,
    sink: Arc<dyn DiagnosticSink>,
}

impl FixLogParser {
    /// Parser with default separators, timestamp stripping and `tracing` diagnostics
    pub fn new() -> Self {
        Self::with_separators(Separators::default())
    }

    pub fn with_separators(separators: Separators) -> Self {
        Self {
            message_separator: separators.message,
            field_parser: FieldParser::new(separators.field, separators.tag_value),
            normalizer: Box::new(TimestampPrefixNormalizer::new()),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_config(config: &ParserConfig) -> Result<Self, FixError> {
        let mut parser = Self::with_separators(config.separators()?);
        parser.normalizer = config.build_normalizer()?;
        Ok(parser)
    }

    /// Replace the line normalizer
    pub fn with_normalizer(mut self, normalizer: Box<dyn LineNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Replace the diagnostics destination
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn normalizer(&self) -> &dyn LineNormalizer {
        self.normalizer.as_ref()
    }

    /// Split raw text into candidate message lines
    pub fn split_lines<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.message_separator.split(text)
    }

    pub(crate) fn parse_line(&self, line: &str, line_number: usize, sink: &dyn DiagnosticSink) -> LineOutcome {
        let normalized = self.normalizer.normalize(line);
        let (message, counts) = self
            .field_parser
            .parse_with_counts(normalized.body, Some(line_number), sink);

        if message.is_empty() {
            LineOutcome::Dropped
        } else {
            LineOutcome::Message(ParsedMessage::new(line_number, normalized.timestamp, message), counts)
        }
    }

    /// Parse a whole log into its non-empty messages, in source order
    pub fn parse_log(&self, text: &str) -> Vec<FixMessage> {
        self.parse_log_detailed(text)
            .into_iter()
            .map(|parsed| parsed.message)
            .collect()
    }

    /// Like [`parse_log`](Self::parse_log), keeping line numbers and timestamps
    pub fn parse_log_detailed(&self, text: &str) -> Vec<ParsedMessage> {
        let sink = self.sink.as_ref();
        self.split_lines(text)
            .into_iter()
            .enumerate()
            .filter_map(|(i, line)| match self.parse_line(line, i + 1, sink) {
                LineOutcome::Message(parsed, _) => Some(parsed),
                LineOutcome::Dropped => None,
            })
            .collect()
    }

    /// Parse a log and gather diagnostics and statistics alongside the messages.
    ///
    /// Diagnostics are also forwarded to the parser's own sink.
    pub fn parse_report(&self, text: &str) -> ParseReport {
        let start_time = Instant::now();
        let collector = CollectingSink::new();

        let outcomes: Vec<LineOutcome> = self
            .split_lines(text)
            .into_iter()
            .enumerate()
            .map(|(i, line)| self.parse_line(line, i + 1, &collector))
            .collect();

        let report = self.assemble_report(outcomes, collector.drain());

        tracing::debug!(
            normalizer = self.normalizer.name(),
            lines = report.statistics.total_lines,
            messages = report.statistics.parsed_messages,
            diagnostics = report.diagnostics.len(),
            elapsed_micros = start_time.elapsed().as_micros() as u64,
            "parsed log"
        );

        report
    }

    /// Build a report from per-line outcomes given in source order
    pub(crate) fn assemble_report(&self, outcomes: Vec<LineOutcome>, mut diagnostics: Vec<Diagnostic>) -> ParseReport {
        let mut statistics = ParsingStatistics::new();
        let mut messages = Vec::new();

        for outcome in outcomes {
            match outcome {
                LineOutcome::Message(parsed, counts) => {
                    statistics.record_message(&parsed.message, &counts);
                    messages.push(parsed);
                }
                LineOutcome::Dropped => statistics.record_dropped_line(),
            }
        }

        // Stable sort: a line's own diagnostics keep their field order
        diagnostics.sort_by_key(|d| d.line_number);
        for diagnostic in &diagnostics {
            statistics.record_diagnostic(diagnostic);
            self.sink.report(diagnostic.clone());
        }

        ParseReport {
            messages,
            diagnostics,
            statistics,
        }
    }
}

impl Default for FixLogParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a log with explicit separators, reporting dropped fields via `tracing`
pub fn parse_log(
    text: &str,
    message_separator: &Separator,
    field_separator: &Separator,
    tag_value_separator: &Separator,
) -> Vec<FixMessage> {
    FixLogParser::with_separators(Separators {
        message: message_separator.clone(),
        field: field_separator.clone(),
        tag_value: tag_value_separator.clone(),
    })
    .parse_log(text)
}
