use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::models::FixMessage;
use crate::separator::Separator;
use crate::tag::is_valid_tag;

/// Per-message counters gathered while parsing fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldCounts {
    pub accepted: usize,
    pub malformed: usize,
    pub invalid_tags: usize,
    pub repeated_tags: usize,
}

/// Splits one message's text into validated fields
#[derive(Debug, Clone)]
pub struct FieldParser {
    field_separator: Separator,
    tag_value_separator: Separator,
}

impl FieldParser {
    pub fn new(field_separator: Separator, tag_value_separator: Separator) -> Self {
        Self {
            field_separator,
            tag_value_separator,
        }
    }

    /// Parse one message. Bad fields are reported to `sink` and skipped.
    pub fn parse_message_text(
        &self,
        text: &str,
        line_number: Option<usize>,
        sink: &dyn DiagnosticSink,
    ) -> FixMessage {
        self.parse_with_counts(text, line_number, sink).0
    }

    pub(crate) fn parse_with_counts(
        &self,
        text: &str,
        line_number: Option<usize>,
        sink: &dyn DiagnosticSink,
    ) -> (FixMessage, FieldCounts) {
        let mut message = FixMessage::new();
        let mut counts = FieldCounts::default();

        for field in self.field_separator.split(text) {
            // A trailing separator leaves an empty token behind
            if field.is_empty() {
                continue;
            }

            let parts = self.tag_value_separator.split(field);
            let [tag, value] = parts.as_slice() else {
                sink.report(Diagnostic::malformed_field(field, line_number));
                counts.malformed += 1;
                continue;
            };

            if !is_valid_tag(*tag) {
                sink.report(Diagnostic::invalid_tag(field, line_number));
                counts.invalid_tags += 1;
                continue;
            }

            let tag = tag.trim();
            if message.is_repeat(tag) {
                counts.repeated_tags += 1;
            }
            message.add_tag(tag, value.trim());
            counts.accepted += 1;
        }

        (message, counts)
    }
}

/// Parse one message's text, reporting dropped fields as `tracing` warnings
pub fn parse_message_text(
    text: &str,
    field_separator: &Separator,
    tag_value_separator: &Separator,
) -> FixMessage {
    FieldParser::new(field_separator.clone(), tag_value_separator.clone())
        .parse_message_text(text, None, &TracingSink)
}
