use clap::Parser;
use fixlog::cli::{Cli, Commands};
use fixlog::commands::{run_convert, run_parse, run_stats};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let Cli { command, global } = Cli::parse();
    init_tracing(global.verbose);

    let result = match command {
        Commands::Parse(args) => run_parse(args, &global),
        Commands::Stats(args) => run_stats(args, &global),
        Commands::Convert(args) => run_convert(args, &global),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
