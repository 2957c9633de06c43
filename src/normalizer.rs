use crate::error::FixError;
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;

/// Prefix emitted by the gateway log source: `YYYYMMDD-HH:MM:SS.fff`
const TIMESTAMP_PREFIX_PATTERN: &str = r"^[0-9]{8}-[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]*";
const COLON_PREFIX_PATTERN: &str = r"^\s*:\s*";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H:%M:%S%.f";

/// A log line with its noise prefix removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLine<'a> {
    /// What remains for the field parser
    pub body: &'a str,
    /// Timestamp found in the stripped prefix, if any
    pub timestamp: Option<NaiveDateTime>,
}

impl<'a> NormalizedLine<'a> {
    pub fn unchanged(line: &'a str) -> Self {
        Self { body: line, timestamp: None }
    }
}

/// Strategy for stripping log-format noise ahead of field parsing.
///
/// A normalizer only ever removes a prefix; it never rejects a line.
pub trait LineNormalizer: Send + Sync {
    fn normalize<'a>(&self, line: &'a str) -> NormalizedLine<'a>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Removes a leading `YYYYMMDD-HH:MM:SS.fff` timestamp and the `:` after it
#[derive(Debug, Clone)]
pub struct TimestampPrefixNormalizer {
    timestamp_regex: Regex,
    colon_regex: Regex,
}

impl TimestampPrefixNormalizer {
    pub fn new() -> Self {
        Self {
            timestamp_regex: Regex::new(TIMESTAMP_PREFIX_PATTERN).expect("timestamp prefix pattern compiles"),
            colon_regex: Regex::new(COLON_PREFIX_PATTERN).expect("colon prefix pattern compiles"),
        }
    }
}

impl Default for TimestampPrefixNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineNormalizer for TimestampPrefixNormalizer {
    fn normalize<'a>(&self, line: &'a str) -> NormalizedLine<'a> {
        let (rest, timestamp) = match self.timestamp_regex.find(line) {
            Some(m) => {
                let timestamp = NaiveDateTime::parse_from_str(m.as_str(), TIMESTAMP_FORMAT).ok();
                (&line[m.end()..], timestamp)
            }
            None => (line, None),
        };

        // The colon strip applies whether or not a timestamp was removed
        let body = match self.colon_regex.find(rest) {
            Some(m) => &rest[m.end()..],
            None => rest,
        };

        NormalizedLine { body, timestamp }
    }

    fn name(&self) -> &'static str {
        "timestamp-prefix"
    }
}

/// Leaves every line untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughNormalizer;

impl LineNormalizer for PassthroughNormalizer {
    fn normalize<'a>(&self, line: &'a str) -> NormalizedLine<'a> {
        NormalizedLine::unchanged(line)
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// Strips leading matches of user-supplied patterns, applied in order.
///
/// With [`after_timestamp`](Self::after_timestamp) the default timestamp
/// prefix is removed first and its timestamp kept.
#[derive(Debug, Clone)]
pub struct PrefixPatternNormalizer {
    patterns: Vec<Regex>,
    timestamps: Option<TimestampPrefixNormalizer>,
}

impl PrefixPatternNormalizer {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, FixError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|e| FixError::regex(p, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns, timestamps: None })
    }

    /// Strip the `YYYYMMDD-HH:MM:SS.fff:` prefix before the user patterns
    pub fn after_timestamp(mut self) -> Self {
        self.timestamps = Some(TimestampPrefixNormalizer::new());
        self
    }
}

impl LineNormalizer for PrefixPatternNormalizer {
    fn normalize<'a>(&self, line: &'a str) -> NormalizedLine<'a> {
        let (mut body, timestamp) = match &self.timestamps {
            Some(timestamps) => {
                let normalized = timestamps.normalize(line);
                (normalized.body, normalized.timestamp)
            }
            None => (line, None),
        };

        for pattern in &self.patterns {
            if let Some(m) = pattern.find(body) {
                if m.start() == 0 {
                    body = &body[m.end()..];
                }
            }
        }

        NormalizedLine { body, timestamp }
    }

    fn name(&self) -> &'static str {
        if self.timestamps.is_some() {
            "timestamp-prefix-pattern"
        } else {
            "prefix-pattern"
        }
    }
}

fn default_normalizer() -> &'static TimestampPrefixNormalizer {
    static DEFAULT: OnceLock<TimestampPrefixNormalizer> = OnceLock::new();
    DEFAULT.get_or_init(TimestampPrefixNormalizer::new)
}

/// Strip the default timestamp prefix from a line
pub fn normalize(line: &str) -> &str {
    default_normalizer().normalize(line).body
}
