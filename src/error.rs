use std::fmt;
use serde::{Deserialize, Serialize};

/// Errors raised by contract violations and unusable configuration.
///
/// Bad input data never produces one of these: malformed fields are reported
/// through a [`DiagnosticSink`](crate::diagnostics::DiagnosticSink) instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FixError {
    /// A caller passed an argument that breaks an operation's contract
    InvalidArgument {
        parameter: String,
        message: String,
    },
    /// A separator or config value cannot be used
    ConfigurationError {
        parameter: String,
        error_message: String,
    },
    /// Regex compilation failed
    RegexError {
        pattern: String,
        error_message: String,
    },
    /// I/O error while loading config or input
    IoError {
        operation: String,
        error_message: String,
    },
    /// Config document could not be decoded
    SerializationError {
        format: String,
        error_message: String,
    },
}

impl fmt::Display for FixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixError::InvalidArgument { parameter, message } => {
                write!(f, "Invalid argument '{}': {}", parameter, message)
            }
            FixError::ConfigurationError { parameter, error_message } => {
                write!(f, "Configuration error for '{}': {}", parameter, error_message)
            }
            FixError::RegexError { pattern, error_message } => {
                write!(f, "Regex error for pattern '{}': {}", pattern, error_message)
            }
            FixError::IoError { operation, error_message } => {
                write!(f, "I/O error during {}: {}", operation, error_message)
            }
            FixError::SerializationError { format, error_message } => {
                write!(f, "Failed to decode {}: {}", format, error_message)
            }
        }
    }
}

impl std::error::Error for FixError {}

impl FixError {
    pub(crate) fn regex(pattern: &str, error: regex::Error) -> Self {
        FixError::RegexError {
            pattern: pattern.to_string(),
            error_message: error.to_string(),
        }
    }

    /// Short variant name, used for grouping in reports
    pub fn kind(&self) -> &'static str {
        match self {
            FixError::InvalidArgument { .. } => "InvalidArgument",
            FixError::ConfigurationError { .. } => "ConfigurationError",
            FixError::RegexError { .. } => "RegexError",
            FixError::IoError { .. } => "IoError",
            FixError::SerializationError { .. } => "SerializationError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_argument() {
        let error = FixError::InvalidArgument {
            parameter: "message".to_string(),
            message: "message target is absent".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid argument 'message': message target is absent");
        assert_eq!(error.kind(), "InvalidArgument");
    }

    #[test]
    fn test_display_configuration_error() {
        let error = FixError::ConfigurationError {
            parameter: "field_separator".to_string(),
            error_message: "separator must not be empty".to_string(),
        };
        assert!(error.to_string().contains("field_separator"));
        assert!(error.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_regex_helper() {
        let compile_error = regex::Regex::new("(").unwrap_err();
        let error = FixError::regex("(", compile_error);
        assert_eq!(error.kind(), "RegexError");
        assert!(error.to_string().starts_with("Regex error for pattern '('"));
    }
}
