//! cfgen CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Discovery error
//! - 4: Template error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cfgen_build::BuildError;

mod commands;
mod generators;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const DISCOVERY_ERROR: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "cfgen=debug"
    } else if cli.quiet {
        "cfgen=warn"
    } else {
        "cfgen=info"
    };

    // Logs go to stderr so documents written to stdout stay clean.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .try_init();

    let result = match cli.command {
        Commands::Build(args) => commands::build::execute(args).await,
        Commands::List(args) => commands::list::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<BuildError>() {
        Some(err) if err.is_discovery() => ExitCodes::DISCOVERY_ERROR,
        Some(BuildError::Config(_)) => ExitCodes::INVALID_ARGS,
        Some(
            BuildError::Core(_)
            | BuildError::DuplicateDefinition(_)
            | BuildError::UnresolvedDependency { .. },
        ) => ExitCodes::TEMPLATE_ERROR,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
