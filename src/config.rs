use crate::error::FixError;
use crate::normalizer::{LineNormalizer, PassthroughNormalizer, PrefixPatternNormalizer, TimestampPrefixNormalizer};
use crate::separator::{
    SeparatorMode, Separators, DEFAULT_FIELD_SEPARATOR, DEFAULT_MESSAGE_SEPARATOR, DEFAULT_TAG_VALUE_SEPARATOR,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which line normalizer to build
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerConfig {
    /// Strip `YYYYMMDD-HH:MM:SS.fff:` prefixes
    #[default]
    TimestampPrefix,
    /// Keep lines as they are
    Passthrough,
    /// Strip leading matches of these regexes, in order
    Patterns(Vec<String>),
    /// Strip the timestamp prefix, then leading matches of these regexes
    TimestampThenPatterns(Vec<String>),
}

/// Configuration for sharded parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Worker threads (0 = rayon default)
    pub num_threads: usize,
    /// Minimum number of lines handed to one worker at a time
    pub min_shard_lines: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            min_shard_lines: 256,
        }
    }
}

/// Parser configuration, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub message_separator: String,
    pub field_separator: String,
    pub tag_value_separator: String,

    /// Whether separators are literal strings or regexes
    pub separator_mode: SeparatorMode,

    /// Case-insensitive matching for regex separators
    pub case_insensitive: bool,

    pub normalizer: NormalizerConfig,

    pub parallel: ParallelConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            message_separator: DEFAULT_MESSAGE_SEPARATOR.to_string(),
            field_separator: DEFAULT_FIELD_SEPARATOR.to_string(),
            tag_value_separator: DEFAULT_TAG_VALUE_SEPARATOR.to_string(),
            separator_mode: SeparatorMode::Literal,
            case_insensitive: true,
            normalizer: NormalizerConfig::TimestampPrefix,
            parallel: ParallelConfig::default(),
        }
    }
}

impl ParserConfig {
    /// Load a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, FixError> {
        let content = std::fs::read_to_string(path).map_err(|e| FixError::IoError {
            operation: format!("reading config {}", path.display()),
            error_message: e.to_string(),
        })?;

        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, FixError> {
        serde_json::from_str(content).map_err(|e| FixError::SerializationError {
            format: "JSON config".to_string(),
            error_message: e.to_string(),
        })
    }

    /// Compile the configured separators
    pub fn separators(&self) -> Result<Separators, FixError> {
        Separators::from_inputs(
            self.separator_mode,
            self.case_insensitive,
            &self.message_separator,
            &self.field_separator,
            &self.tag_value_separator,
        )
    }

    /// Build the configured line normalizer
    pub fn build_normalizer(&self) -> Result<Box<dyn LineNormalizer>, FixError> {
        let normalizer: Box<dyn LineNormalizer> = match &self.normalizer {
            NormalizerConfig::TimestampPrefix => Box::new(TimestampPrefixNormalizer::new()),
            NormalizerConfig::Passthrough => Box::new(PassthroughNormalizer),
            NormalizerConfig::Patterns(patterns) => {
                Box::new(PrefixPatternNormalizer::new(patterns.as_slice())?)
            }
            NormalizerConfig::TimestampThenPatterns(patterns) => {
                Box::new(PrefixPatternNormalizer::new(patterns.as_slice())?.after_timestamp())
            }
        };
        Ok(normalizer)
    }
}
