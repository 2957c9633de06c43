use crate::config::{ParallelConfig, ParserConfig};
use crate::diagnostics::CollectingSink;
use crate::error::FixError;
use crate::log_parser::{FixLogParser, LineOutcome};
use crate::models::{FixMessage, ParsedMessage};
use crate::parse_result::ParseReport;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Parses large logs by sharding lines across a rayon thread pool.
///
/// Output is identical to [`FixLogParser`]: messages come back in source
/// order because no line depends on another.
pub struct ParallelParser {
    parser: FixLogParser,
    config: ParallelConfig,
    pool: Option<ThreadPool>,
}

impl ParallelParser {
    pub fn new(parser: FixLogParser) -> Result<Self, FixError> {
        Self::with_config(parser, ParallelConfig::default())
    }

    pub fn with_config(parser: FixLogParser, config: ParallelConfig) -> Result<Self, FixError> {
        // A dedicated pool only when a thread count was asked for
        let pool = if config.num_threads > 0 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.num_threads)
                .thread_name(|i| format!("fixlog-worker-{}", i))
                .build()
                .map_err(|e| FixError::ConfigurationError {
                    parameter: "parallel.num_threads".to_string(),
                    error_message: e.to_string(),
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(Self { parser, config, pool })
    }

    /// Build both the line parser and the pool from one config
    pub fn from_parser_config(config: &ParserConfig) -> Result<Self, FixError> {
        Self::with_config(FixLogParser::with_config(config)?, config.parallel.clone())
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    pub fn parser(&self) -> &FixLogParser {
        &self.parser
    }

    fn install<R: Send>(&self, work: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }

    fn parse_outcomes(&self, text: &str, collector: &CollectingSink) -> Vec<LineOutcome> {
        let lines = self.parser.split_lines(text);
        let min_len = self.config.min_shard_lines.max(1);

        self.install(|| {
            lines
                .par_iter()
                .enumerate()
                .with_min_len(min_len)
                .map(|(i, line)| self.parser.parse_line(line, i + 1, collector))
                .collect()
        })
    }

    /// Parse a whole log, in source order
    pub fn parse_log(&self, text: &str) -> Vec<FixMessage> {
        self.parse_log_detailed(text)
            .into_iter()
            .map(|parsed| parsed.message)
            .collect()
    }

    pub fn parse_log_detailed(&self, text: &str) -> Vec<ParsedMessage> {
        self.parse_report(text).messages
    }

    /// Parse a log with diagnostics and statistics.
    ///
    /// Diagnostics are ordered by line no matter which worker produced them.
    pub fn parse_report(&self, text: &str) -> ParseReport {
        let collector = CollectingSink::new();
        let outcomes = self.parse_outcomes(text, &collector);
        let report = self.parser.assemble_report(outcomes, collector.drain());

        tracing::debug!(
            threads = self.config.num_threads,
            lines = report.statistics.total_lines,
            messages = report.statistics.parsed_messages,
            "parsed log in parallel"
        );

        report
    }
}
