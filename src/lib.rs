pub mod error;
pub mod separator;
pub mod tag;
pub mod models;
pub mod registrar;
pub mod diagnostics;
pub mod normalizer;
pub mod field_parser;
pub mod statistics;
pub mod parse_result;
pub mod log_parser;
pub mod parallel_parser;
pub mod config;
pub mod cli;
pub mod commands;


pub use error::FixError;
pub use separator::{Separator, SeparatorMode, Separators};
pub use tag::{base_tag, is_valid_tag};
pub use models::{FixMessage, ParsedMessage};
pub use registrar::add_tag;
pub use diagnostics::{
    ChannelSink, CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, NullSink, TracingSink,
};
pub use normalizer::{
    normalize, LineNormalizer, NormalizedLine, PassthroughNormalizer, PrefixPatternNormalizer,
    TimestampPrefixNormalizer,
};
pub use field_parser::{parse_message_text, FieldCounts, FieldParser};
pub use statistics::ParsingStatistics;
pub use parse_result::ParseReport;
pub use log_parser::{parse_log, FixLogParser};
pub use parallel_parser::ParallelParser;
pub use config::{NormalizerConfig, ParallelConfig, ParserConfig};
