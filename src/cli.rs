use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fixlog")]
#[command(author, version, about = "Parse FIX-style tag=value message logs into structured messages")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Clone, Default)]
pub struct GlobalArgs {
    /// Number of parallel threads (0 = auto-detect)
    #[arg(long, short = 'j', global = true, default_value = "0")]
    pub parallel: usize,

    /// JSON parser configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse logs and print the messages
    Parse(ParseArgs),

    /// Show parsing statistics and tag summaries
    Stats(StatsArgs),

    /// Convert logs to a structured format
    Convert(ConvertArgs),
}

/// Flags that shape how raw text is split into messages and fields
#[derive(Args, Clone, Default)]
pub struct SeparatorArgs {
    /// Separator between messages (default: newline)
    #[arg(long)]
    pub message_separator: Option<String>,

    /// Separator between fields (default: \x01)
    #[arg(long)]
    pub field_separator: Option<String>,

    /// Separator between a tag and its value (default: =)
    #[arg(long)]
    pub tag_value_separator: Option<String>,

    /// Treat separators as case-insensitive regular expressions
    #[arg(long)]
    pub regex: bool,

    /// Keep leading timestamps instead of stripping them
    #[arg(long)]
    pub no_strip_timestamps: bool,

    /// Strip a leading match of this regex from every line, after the timestamp
    /// prefix unless --no-strip-timestamps is given (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub strip_prefix: Vec<String>,
}

#[derive(Args)]
pub struct ParseArgs {
    /// Log files to parse (glob patterns, `-` for stdin)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub separators: SeparatorArgs,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Tags to show (comma-separated, e.g. 35,49,56)
    #[arg(long)]
    pub fields: Option<String>,

    /// Keep only messages with this tag value (format: tag=value)
    #[arg(long = "field", short = 'F')]
    pub field_filters: Option<Vec<String>>,

    /// Hide session-level messages (heartbeats, logons, resends...)
    #[arg(long)]
    pub hide_admin: bool,

    /// Maximum number of messages
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Log files to analyze
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub separators: SeparatorArgs,

    /// Count messages by the value of this tag
    #[arg(long)]
    pub count_by: Option<String>,

    /// Show top N entries
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Output format (table or json)
    #[arg(long, short = 'f', value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Log files to convert
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub separators: SeparatorArgs,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output_file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable blocks
    Table,
    /// A single JSON array
    Json,
    /// Newline-delimited JSON, one message per line
    Ndjson,
    /// CSV, one row per field
    Csv,
    /// Messages re-joined as tag=value|tag=value
    Raw,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Raw => write!(f, "raw"),
        }
    }
}
