//! Lockwatch CLI entry point.
//!
//! Parses arguments, initializes logging from the effective configuration,
//! dispatches to a command handler and maps failures to exit codes.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;

use lockwatch_core::config::GeneralConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli).await {
        eprintln!("error: {e}");
        return exit_code(&e);
    }
    lockwatch_core::metrics::describe_all();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, code = e.exit_code(), "command failed");
            eprintln!("error: {e}");
            exit_code(&e)
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Audit(args) => commands::audit::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}

/// Logging follows `[general]` of the config when it loads, defaults otherwise.
///
/// A broken config is reported by the command itself, not here.
async fn init_logging(cli: &Cli) -> Result<(), CliError> {
    let mut general = match commands::load_config(&cli.config).await {
        Ok(config) => config.general,
        Err(_) => GeneralConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    logging::init_tracing(&general)
}

fn exit_code(e: &CliError) -> ExitCode {
    ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
}
