//! Black Road CLI - encrypted-config infrastructure deployments
//!
//! This is the main entry point for the Black Road command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Init) => commands::init::run(cli.config.as_deref()).await?,
        Some(Commands::Apply) => commands::apply::run(cli.config.as_deref()).await?,
        Some(Commands::Plan) => commands::plan::run(cli.config.as_deref()).await?,
        None => commands::welcome(),
    }

    output::info("Exiting");
    Ok(())
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
