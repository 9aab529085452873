//! TAL CLI - attribute-language template engine.
//!
//! Provides commands for:
//! - `render`: Process a template file against JSON data

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::RenderArgs;

/// TAL - attribute-language template engine.
#[derive(Parser)]
#[command(name = "tal", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template against a JSON data file.
    Render(RenderArgs),
}

fn main() {
    let cli = Cli::parse();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
    };

    if let Err(err) = result {
        #[allow(clippy::print_stderr)] // top-level error reporting
        {
            eprintln!("Error: {err}");
        }
        std::process::exit(1);
    }
}
