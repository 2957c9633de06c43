use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::field_parser::FieldCounts;
use crate::models::FixMessage;
use crate::tag::base_tag;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counters describing one parsing session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsingStatistics {
    /// Lines produced by the message separator
    pub total_lines: usize,
    /// Lines that produced a non-empty message
    pub parsed_messages: usize,
    /// Lines dropped because no field survived
    pub dropped_lines: usize,
    /// Fields kept across all messages
    pub total_fields: usize,
    /// Fields dropped for not splitting into a tag and a value
    pub malformed_fields: usize,
    /// Fields dropped for a non-numeric tag
    pub invalid_tags: usize,
    /// Fields stored under a suffixed name because their tag repeated
    pub repeated_tags: usize,
    /// Occurrences per base tag
    pub tag_distribution: HashMap<String, usize>,
}

impl ParsingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a line that produced a message
    pub fn record_message(&mut self, message: &FixMessage, counts: &FieldCounts) {
        self.total_lines += 1;
        self.parsed_messages += 1;
        self.total_fields += message.len();
        self.repeated_tags += counts.repeated_tags;
        for name in message.keys() {
            *self.tag_distribution.entry(base_tag(name).to_string()).or_insert(0) += 1;
        }
    }

    /// Record a line that produced nothing
    pub fn record_dropped_line(&mut self) {
        self.total_lines += 1;
        self.dropped_lines += 1;
    }

    pub fn record_diagnostic(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::MalformedField => self.malformed_fields += 1,
            DiagnosticKind::InvalidTag => self.invalid_tags += 1,
        }
    }

    /// Fold another session's counters into this one
    pub fn merge(&mut self, other: &ParsingStatistics) {
        self.total_lines += other.total_lines;
        self.parsed_messages += other.parsed_messages;
        self.dropped_lines += other.dropped_lines;
        self.total_fields += other.total_fields;
        self.malformed_fields += other.malformed_fields;
        self.invalid_tags += other.invalid_tags;
        self.repeated_tags += other.repeated_tags;
        for (tag, count) in &other.tag_distribution {
            *self.tag_distribution.entry(tag.clone()).or_insert(0) += count;
        }
    }

    /// Share of lines that produced a message, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            (self.parsed_messages as f64 / self.total_lines as f64) * 100.0
        }
    }

    /// Share of seen fields that were dropped, as a percentage
    pub fn field_error_rate(&self) -> f64 {
        let dropped = self.malformed_fields + self.invalid_tags;
        let seen = self.total_fields + dropped;
        if seen == 0 {
            0.0
        } else {
            (dropped as f64 / seen as f64) * 100.0
        }
    }

    /// Tags by descending occurrence, ties broken numerically
    pub fn top_tags(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut tags: Vec<(&str, usize)> = self
            .tag_distribution
            .iter()
            .map(|(tag, count)| (tag.as_str(), *count))
            .collect();
        tags.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.0.len().cmp(&b.0.len()))
                .then_with(|| a.0.cmp(b.0))
        });
        tags.truncate(limit);
        tags
    }

    /// Plain-text summary
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Parsing Statistics Report ===\n");
        report.push_str(&format!("Total lines: {}\n", self.total_lines));
        report.push_str(&format!("Messages: {} ({:.2}%)\n", self.parsed_messages, self.success_rate()));
        report.push_str(&format!("Dropped lines: {}\n", self.dropped_lines));

        report.push_str("\n--- Fields ---\n");
        report.push_str(&format!("Accepted: {}\n", self.total_fields));
        report.push_str(&format!("Malformed: {}\n", self.malformed_fields));
        report.push_str(&format!("Invalid tags: {}\n", self.invalid_tags));
        report.push_str(&format!("Repeated tags: {}\n", self.repeated_tags));
        report.push_str(&format!("Field error rate: {:.2}%\n", self.field_error_rate()));

        if !self.tag_distribution.is_empty() {
            report.push_str("\n--- Top Tags ---\n");
            for (tag, count) in self.top_tags(10) {
                report.push_str(&format!("{}: {}\n", tag, count));
            }
        }

        report
    }
}
