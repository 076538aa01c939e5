//! Quill CLI - static blog generator.
//!
//! Provides commands for:
//! - `build`: Render the site once
//! - `watch`: Rebuild whenever the source tree changes
//! - `serve`: Watch and serve the output directory over HTTP
//! - `new`: Scaffold a new post

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, NewArgs, ServeArgs, WatchArgs};
use error::CliError;
use output::Output;

/// Quill - static blog generator.
#[derive(Parser)]
#[command(name = "quill", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site once.
    Build(BuildArgs),
    /// Build, then rebuild on every change.
    Watch(WatchArgs),
    /// Watch and serve the output directory.
    Serve(ServeArgs),
    /// Create a new post.
    New(NewArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Build(args) => args.config.verbose,
            Self::Watch(args) => args.config.verbose,
            Self::Serve(args) => args.config.verbose,
            Self::New(args) => args.config.verbose,
        }
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Build(args) => args.execute(),
        Commands::Watch(args) => args.execute(),
        Commands::Serve(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(args.execute())
        }
        Commands::New(args) => args.execute(),
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli.command) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
