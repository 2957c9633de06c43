use crate::cli::OutputFormat;
use crate::tag::base_tag;
use crate::{ParsedMessage, ParsingStatistics};
use colored::*;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::error::Error;
use std::io::Write;

/// A parsed message and the input it came from
pub struct SourcedMessage {
    pub source: String,
    pub parsed: ParsedMessage,
}

#[derive(Serialize)]
struct JsonMessage<'a> {
    source: &'a str,
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    fields: VisibleFields<'a>,
}

// The selected fields of one message, as an object in insertion order
struct VisibleFields<'a> {
    formatter: &'a OutputFormatter,
    parsed: &'a ParsedMessage,
}

impl Serialize for VisibleFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.formatter.visible(self.parsed) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
    fields: Option<Vec<String>>,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format, fields: None }
    }

    pub fn with_fields(mut self, fields: Option<String>) -> Self {
        self.fields = fields.map(|f| f.split(',').map(|s| s.trim().to_string()).collect());
        self
    }

    fn shows(&self, field_name: &str) -> bool {
        match &self.fields {
            Some(allowed) => allowed.iter().any(|tag| tag == base_tag(field_name)),
            None => true,
        }
    }

    fn visible<'a>(&'a self, parsed: &'a ParsedMessage) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        parsed.message.iter().filter(move |(name, _)| self.shows(name))
    }

    /// Write every message in the configured format
    pub fn write_all(&self, writer: &mut dyn Write, messages: &[SourcedMessage]) -> Result<(), Box<dyn Error>> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<JsonMessage> = messages.iter().map(|m| self.json_message(m)).collect();
                serde_json::to_writer_pretty(&mut *writer, &values)?;
                writeln!(writer)?;
            }
            OutputFormat::Ndjson => {
                for message in messages {
                    writeln!(writer, "{}", serde_json::to_string(&self.json_message(message))?)?;
                }
            }
            OutputFormat::Csv => self.write_csv(writer, messages)?,
            OutputFormat::Table => {
                for message in messages {
                    writeln!(writer, "{}", self.format_table(message))?;
                }
            }
            OutputFormat::Raw => {
                for message in messages {
                    writeln!(writer, "{}", self.format_raw(&message.parsed))?;
                }
            }
        }
        Ok(())
    }

    fn format_table(&self, message: &SourcedMessage) -> String {
        let parsed = &message.parsed;
        let ts = parsed
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| "-".to_string());

        let mut output = format!(
            "{} {} {}\n",
            "──".dimmed(),
            format!("{}:{}", message.source, parsed.line_number).cyan(),
            ts.dimmed()
        );

        let width = self.visible(parsed).map(|(name, _)| name.len()).max().unwrap_or(0);
        for (name, value) in self.visible(parsed) {
            output.push_str(&format!("  {:>width$} = {}\n", name.yellow(), value, width = width));
        }

        output
    }

    fn format_raw(&self, parsed: &ParsedMessage) -> String {
        self.visible(parsed)
            .map(|(name, value)| format!("{}={}|", name, value))
            .collect()
    }

    fn json_message<'a>(&'a self, message: &'a SourcedMessage) -> JsonMessage<'a> {
        JsonMessage {
            source: &message.source,
            line: message.parsed.line_number,
            timestamp: message
                .parsed
                .timestamp
                .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            fields: VisibleFields { formatter: self, parsed: &message.parsed },
        }
    }

    fn write_csv(&self, writer: &mut dyn Write, messages: &[SourcedMessage]) -> Result<(), Box<dyn Error>> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["source", "line", "timestamp", "tag", "value"])?;

        for message in messages {
            let line = message.parsed.line_number.to_string();
            let ts = message
                .parsed
                .timestamp
                .map(|t| t.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
                .unwrap_or_default();
            for (name, value) in self.visible(&message.parsed) {
                csv_writer.write_record([message.source.as_str(), line.as_str(), ts.as_str(), name, value])?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }
}

pub fn print_stats_summary(stats: &ParsingStatistics) {
    eprintln!("\n{}", "═".repeat(50).cyan());
    eprintln!("{}", "SUMMARY".cyan().bold());
    eprintln!("{}", "═".repeat(50).cyan());
    eprintln!("Total lines:      {}", stats.total_lines.to_string().white().bold());
    eprintln!("Messages:         {} ({:.1}%)",
        stats.parsed_messages.to_string().green(),
        stats.success_rate());
    eprintln!("Dropped lines:    {}", stats.dropped_lines.to_string().dimmed());
    eprintln!("Fields:           {}", stats.total_fields.to_string().white());
    eprintln!("Malformed fields: {}", stats.malformed_fields.to_string().yellow());
    eprintln!("Invalid tags:     {}", stats.invalid_tags.to_string().yellow());
    eprintln!("Repeated tags:    {}", stats.repeated_tags.to_string().cyan());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixMessage;
    use chrono::NaiveDateTime;

    fn sample() -> Vec<SourcedMessage> {
        let mut message = FixMessage::new();
        message.add_tag("8", "FIX.4.4").add_tag("35", "D").add_tag("58", "a,b").add_tag("35", "8");
        let ts = NaiveDateTime::parse_from_str("20240101-10:00:00.250", "%Y%m%d-%H:%M:%S%.f").unwrap();
        vec![SourcedMessage {
            source: "in.log".to_string(),
            parsed: ParsedMessage::new(4, Some(ts), message),
        }]
    }

    fn render(formatter: &OutputFormatter) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        formatter.write_all(&mut buffer, &sample()).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_raw_output() {
        let output = render(&OutputFormatter::new(OutputFormat::Raw));
        assert_eq!(output, "8=FIX.4.4|35=D|58=a,b|35_1=8|\n");
    }

    #[test]
    fn test_field_selection_matches_base_tag() {
        let output = render(&OutputFormatter::new(OutputFormat::Raw).with_fields(Some("35".to_string())));
        assert_eq!(output, "35=D|35_1=8|\n");
    }

    #[test]
    fn test_ndjson_output_keeps_order() {
        let output = render(&OutputFormatter::new(OutputFormat::Ndjson));
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["source"], "in.log");
        assert_eq!(value["line"], 4);
        assert_eq!(value["timestamp"], "2024-01-01T10:00:00.250");
        assert_eq!(value["fields"]["35_1"], "8");
        assert!(output.contains(r#""fields":{"8":"FIX.4.4","35":"D","58":"a,b","35_1":"8"}"#));
    }

    #[test]
    fn test_json_output_is_array() {
        let output = render(&OutputFormatter::new(OutputFormat::Json));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_csv_output() {
        let output = render(&OutputFormatter::new(OutputFormat::Csv));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "source,line,timestamp,tag,value");
        assert_eq!(lines[1], "in.log,4,2024-01-01T10:00:00.250,8,FIX.4.4");
        assert_eq!(lines[3], "in.log,4,2024-01-01T10:00:00.250,58,\"a,b\"");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_table_output() {
        let output = render(&OutputFormatter::new(OutputFormat::Table));
        assert!(output.contains("in.log:4"));
        assert!(output.contains("2024-01-01 10:00:00.250"));
        assert!(output.contains("  35_1 = 8"));
    }
}
