use crate::cli::{ConvertArgs, GlobalArgs, OutputFormat};
use crate::commands::output::{OutputFormatter, SourcedMessage};
use crate::commands::parse::{expand_globs, parse_source, resolve_config};
use crate::ParallelParser;
use std::fs::File;
use std::io::{stdout, Write};

pub fn run_convert(args: ConvertArgs, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let format = match args.format {
        OutputFormat::Table => {
            tracing::warn!("table is not a conversion format, writing json instead");
            OutputFormat::Json
        }
        other => other,
    };

    let config = resolve_config(global, &args.separators)?;
    let parser = ParallelParser::from_parser_config(&config)?;
    let formatter = OutputFormatter::new(format);

    let files = expand_globs(&args.files)?;
    if files.is_empty() {
        eprintln!("No files matched the given patterns");
        return Ok(());
    }

    let mut messages = Vec::new();
    for file_path in &files {
        let (source, report) = parse_source(&parser, file_path)?;
        messages.extend(
            report
                .messages
                .into_iter()
                .map(|parsed| SourcedMessage { source: source.clone(), parsed }),
        );
    }

    let mut output: Box<dyn Write> = if let Some(ref path) = args.output_file {
        Box::new(File::create(path)?)
    } else {
        Box::new(stdout())
    };
    formatter.write_all(&mut output, &messages)?;
    output.flush()?;

    eprintln!("Converted {} messages from {} files", messages.len(), files.len());
    Ok(())
}
