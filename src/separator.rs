use crate::error::FixError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MESSAGE_SEPARATOR: &str = "\n";
pub const DEFAULT_FIELD_SEPARATOR: &str = "\x01";
pub const DEFAULT_TAG_VALUE_SEPARATOR: &str = "=";

/// How separator strings supplied by an input provider are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeparatorMode {
    /// Split on the exact string
    #[default]
    Literal,
    /// Split on every match of a regular expression
    Pattern,
}

/// A delimiter used to split text, either a fixed string or a regex
#[derive(Debug, Clone)]
pub enum Separator {
    Literal(String),
    Pattern(Regex),
}

impl Separator {
    /// Build a literal separator. Empty strings are rejected.
    pub fn literal(separator: &str) -> Result<Self, FixError> {
        if separator.is_empty() {
            return Err(FixError::ConfigurationError {
                parameter: "separator".to_string(),
                error_message: "separator must not be empty".to_string(),
            });
        }
        Ok(Separator::Literal(separator.to_string()))
    }

    /// Build a regex separator.
    ///
    /// Patterns whose shortest match is empty are rejected, along with the
    /// empty pattern itself.
    pub fn pattern(pattern: &str, case_insensitive: bool) -> Result<Self, FixError> {
        if pattern.is_empty() {
            return Err(FixError::ConfigurationError {
                parameter: "separator".to_string(),
                error_message: "separator pattern must not be empty".to_string(),
            });
        }

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| FixError::regex(pattern, e))?;

        // Zero-width matches such as `\b` or `(?m)^` would split between characters
        let hir = regex_syntax::Parser::new()
            .parse(pattern)
            .map_err(|e| FixError::RegexError {
                pattern: pattern.to_string(),
                error_message: e.to_string(),
            })?;
        if hir.properties().minimum_len() == Some(0) {
            return Err(FixError::ConfigurationError {
                parameter: "separator".to_string(),
                error_message: format!("pattern '{}' can match the empty string", pattern),
            });
        }

        Ok(Separator::Pattern(regex))
    }

    /// Split `text` into pieces, keeping empty pieces and their order
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            Separator::Literal(s) => text.split(s.as_str()).collect(),
            Separator::Pattern(re) => re.split(text).collect(),
        }
    }

    /// Source text of the separator
    pub fn as_str(&self) -> &str {
        match self {
            Separator::Literal(s) => s,
            Separator::Pattern(re) => re.as_str(),
        }
    }
}

/// The three separators that shape a log: between messages, between fields
/// and between a tag and its value.
#[derive(Debug, Clone)]
pub struct Separators {
    pub message: Separator,
    pub field: Separator,
    pub tag_value: Separator,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            message: Separator::Literal(DEFAULT_MESSAGE_SEPARATOR.to_string()),
            field: Separator::Literal(DEFAULT_FIELD_SEPARATOR.to_string()),
            tag_value: Separator::Literal(DEFAULT_TAG_VALUE_SEPARATOR.to_string()),
        }
    }
}

impl Separators {
    /// Build separators from user-editable inputs.
    ///
    /// An empty input falls back to that separator's default.
    pub fn from_inputs(
        mode: SeparatorMode,
        case_insensitive: bool,
        message: &str,
        field: &str,
        tag_value: &str,
    ) -> Result<Self, FixError> {
        Ok(Self {
            message: build_input(
                "message_separator",
                mode,
                case_insensitive,
                message,
                DEFAULT_MESSAGE_SEPARATOR,
            )?,
            field: build_input(
                "field_separator",
                mode,
                case_insensitive,
                field,
                DEFAULT_FIELD_SEPARATOR,
            )?,
            tag_value: build_input(
                "tag_value_separator",
                mode,
                case_insensitive,
                tag_value,
                DEFAULT_TAG_VALUE_SEPARATOR,
            )?,
        })
    }
}

fn build_input(
    parameter: &str,
    mode: SeparatorMode,
    case_insensitive: bool,
    input: &str,
    default: &str,
) -> Result<Separator, FixError> {
    if input.is_empty() {
        return Ok(Separator::Literal(default.to_string()));
    }

    let result = match mode {
        SeparatorMode::Literal => Separator::literal(input),
        SeparatorMode::Pattern => Separator::pattern(input, case_insensitive),
    };

    // Name the offending separator instead of the generic parameter
    result.map_err(|e| match e {
        FixError::ConfigurationError { error_message, .. } => FixError::ConfigurationError {
            parameter: parameter.to_string(),
            error_message,
        },
        other => other,
    })
}

/// Expand backslash escapes typed on a command line.
///
/// Supports `\n`, `\r`, `\t`, `\\` and `\xHH`. Unknown escapes are kept verbatim.
pub fn unescape(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }

        match chars.peek().copied() {
            Some('n') => {
                chars.next();
                output.push('\n');
            }
            Some('r') => {
                chars.next();
                output.push('\r');
            }
            Some('t') => {
                chars.next();
                output.push('\t');
            }
            Some('\\') => {
                chars.next();
                output.push('\\');
            }
            Some('x') => {
                let mut lookahead = chars.clone();
                lookahead.next();
                let hex: String = lookahead.by_ref().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) if hex.len() == 2 && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                        output.push(char::from(byte));
                        chars = lookahead;
                    }
                    _ => output.push('\\'),
                }
            }
            _ => output.push('\\'),
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_split_keeps_empty_pieces() {
        let separator = Separator::literal("\x01").unwrap();
        assert_eq!(separator.split("1=A\x01\x012=B\x01"), vec!["1=A", "", "2=B", ""]);
        assert_eq!(separator.split(""), vec![""]);
    }

    #[test]
    fn test_literal_rejects_empty() {
        let result = Separator::literal("");
        assert!(matches!(result, Err(FixError::ConfigurationError { .. })));
    }

    #[test]
    fn test_pattern_split() {
        let separator = Separator::pattern(r"\||;", false).unwrap();
        assert_eq!(separator.split("1=A|2=B;3=C"), vec!["1=A", "2=B", "3=C"]);
    }

    #[test]
    fn test_pattern_case_insensitive() {
        let separator = Separator::pattern("SOH", true).unwrap();
        assert_eq!(separator.split("1=Asoh2=B"), vec!["1=A", "2=B"]);
    }

    #[test]
    fn test_pattern_rejects_empty_match() {
        assert!(matches!(Separator::pattern("x*", false), Err(FixError::ConfigurationError { .. })));
        assert!(matches!(Separator::pattern("", false), Err(FixError::ConfigurationError { .. })));
        assert!(matches!(Separator::pattern("|", false), Err(FixError::ConfigurationError { .. })));
    }

    #[test]
    fn test_pattern_rejects_zero_width_assertions() {
        for pattern in [r"\b", r"\B", "(?m)^", "$", r"\b|x"] {
            assert!(
                matches!(Separator::pattern(pattern, false), Err(FixError::ConfigurationError { .. })),
                "pattern {:?} should be rejected",
                pattern
            );
        }

        let separator = Separator::pattern(r"\b\|\b", false).unwrap();
        assert_eq!(separator.split("8=FIX|35=D"), vec!["8=FIX", "35=D"]);
    }

    #[test]
    fn test_pattern_rejects_invalid_regex() {
        assert!(matches!(Separator::pattern("(", false), Err(FixError::RegexError { .. })));
    }

    #[test]
    fn test_from_inputs_empty_falls_back_to_defaults() {
        let separators = Separators::from_inputs(SeparatorMode::Pattern, true, "", "", "").unwrap();
        assert_eq!(separators.message.as_str(), "\n");
        assert_eq!(separators.field.as_str(), "\x01");
        assert_eq!(separators.tag_value.as_str(), "=");
    }

    #[test]
    fn test_from_inputs_names_bad_separator() {
        let error = Separators::from_inputs(SeparatorMode::Pattern, false, "\n", "a*", "=").unwrap_err();
        match error {
            FixError::ConfigurationError { parameter, .. } => assert_eq!(parameter, "field_separator"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"\x01"), "\x01");
        assert_eq!(unescape(r"\n"), "\n");
        assert_eq!(unescape(r"a\tb"), "a\tb");
        assert_eq!(unescape(r"\\"), "\\");
        assert_eq!(unescape("|"), "|");
        assert_eq!(unescape(r"\xZZ"), r"\xZZ");
        assert_eq!(unescape(r"\q"), r"\q");
    }
}
