use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a field was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Splitting on the tag/value separator did not give exactly two parts
    MalformedField,
    /// The tag part is not a numeric tag
    InvalidTag,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedField => "MalformedField",
            DiagnosticKind::InvalidTag => "InvalidTag",
        }
    }
}

/// A non-fatal warning about one field of one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The raw field token that was dropped
    pub field: String,
    /// 1-based source line, when known
    pub line_number: Option<usize>,
}

impl Diagnostic {
    pub fn malformed_field(field: &str, line_number: Option<usize>) -> Self {
        Self {
            kind: DiagnosticKind::MalformedField,
            field: field.to_string(),
            line_number,
        }
    }

    pub fn invalid_tag(field: &str, line_number: Option<usize>) -> Self {
        Self {
            kind: DiagnosticKind::InvalidTag,
            field: field.to_string(),
            line_number,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line_number {
            write!(f, "line {}: ", line)?;
        }
        match self.kind {
            DiagnosticKind::MalformedField => write!(f, "unable to parse field '{}'", self.field),
            DiagnosticKind::InvalidTag => write!(f, "invalid tag for field '{}'", self.field),
        }
    }
}

/// Destination for field-level parse warnings.
///
/// Sinks are shared across worker threads, hence `Send + Sync`.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Emits each diagnostic as a `tracing` warning
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = diagnostic.kind.as_str(),
            line = diagnostic.line_number,
            field = %diagnostic.field,
            "{}",
            diagnostic
        );
    }
}

/// Drops every diagnostic
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Keeps diagnostics in memory for later inspection
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything reported so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Take everything reported so far, leaving the sink empty
    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }
}

/// Forwards diagnostics over a channel. A disconnected receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<Diagnostic>,
}

impl ChannelSink {
    pub fn new(sender: Sender<Diagnostic>) -> Self {
        Self { sender }
    }
}

impl DiagnosticSink for ChannelSink {
    fn report(&self, diagnostic: Diagnostic) {
        let _ = self.sender.send(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::malformed_field("garbage", Some(4));
        assert_eq!(diagnostic.to_string(), "line 4: unable to parse field 'garbage'");

        let diagnostic = Diagnostic::invalid_tag("a=1", None);
        assert_eq!(diagnostic.to_string(), "invalid tag for field 'a=1'");
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        assert!(sink.is_empty());

        sink.report(Diagnostic::malformed_field("x", Some(1)));
        sink.report(Diagnostic::invalid_tag("y=2", Some(2)));

        assert_eq!(sink.len(), 2);
        let collected = sink.diagnostics();
        assert_eq!(collected[0].kind, DiagnosticKind::MalformedField);
        assert_eq!(collected[1].kind, DiagnosticKind::InvalidTag);

        let drained = sink.drain();
        assert_eq!(drained.len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_channel_sink() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let sink = ChannelSink::new(sender);
        sink.report(Diagnostic::invalid_tag("abc=1", Some(7)));

        let received = receiver.try_recv().unwrap();
        assert_eq!(received.line_number, Some(7));
        assert_eq!(received.field, "abc=1");
    }

    #[test]
    fn test_channel_sink_ignores_disconnected_receiver() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        drop(receiver);
        ChannelSink::new(sender).report(Diagnostic::malformed_field("x", None));
    }

    #[test]
    fn test_closure_sink() {
        let count = AtomicUsize::new(0);
        let sink = |_: Diagnostic| {
            count.fetch_add(1, Ordering::SeqCst);
        };
        sink.report(Diagnostic::malformed_field("x", None));
        sink.report(Diagnostic::malformed_field("y", None));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_null_and_tracing_sinks_accept_reports() {
        NullSink.report(Diagnostic::malformed_field("x", None));
        TracingSink.report(Diagnostic::invalid_tag("x=1", Some(1)));
    }
}
