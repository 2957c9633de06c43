use crate::diagnostics::Diagnostic;
use crate::models::{FixMessage, ParsedMessage};
use crate::statistics::ParsingStatistics;
use serde::Serialize;

/// Everything a parsing session produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseReport {
    /// Non-empty messages in source order
    pub messages: Vec<ParsedMessage>,
    /// Dropped-field warnings, ordered by line
    pub diagnostics: Vec<Diagnostic>,
    pub statistics: ParsingStatistics,
}

impl ParseReport {
    /// Drop line metadata and keep only the messages
    pub fn into_messages(self) -> Vec<FixMessage> {
        self.messages.into_iter().map(|parsed| parsed.message).collect()
    }

    /// True when no field was dropped
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics attached to one source line
    pub fn diagnostics_for_line(&self, line_number: usize) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.line_number == Some(line_number))
    }
}
