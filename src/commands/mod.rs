pub mod parse;
pub mod stats;
pub mod convert;
pub mod output;

pub use parse::run_parse;
pub use stats::run_stats;
pub use convert::run_convert;
