//! stackpilot CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 5: Engine error
//! - 6: Database error

use std::process::ExitCode;

use clap::Parser;
use pilot_db::DbError;
use pilot_iac::AutomationError;
use pilot_runner::RunnerError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const ENGINE_ERROR: u8 = 5;
    pub const DATABASE_ERROR: u8 = 6;
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Engine output owns stdout, logs go to stderr
    let filter = log_filter(cli.verbose, std::env::var("RUST_LOG").ok().as_deref());
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let engine = cli.engine;
    let result = match cli.command {
        Commands::Inline(args) => commands::inline::execute(args, &engine).await,
        Commands::Local(args) => commands::local::execute(args, &engine).await,
        Commands::DbMigrate(args) => commands::db_migrate::execute(args, &engine).await,
        Commands::PreviewUp(args) => commands::preview_up::execute(args, &engine).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// `RUST_LOG` replaces the default directives entirely when it is set.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return filter;
    }
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::new(format!("warn,pilot={level}"))
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<AutomationError>() {
            return match err {
                AutomationError::ProjectNotFound(_) => ExitCodes::INVALID_ARGS,
                AutomationError::InvalidProgram(_) | AutomationError::Io(_) => {
                    ExitCodes::GENERAL_ERROR
                }
                _ => ExitCodes::ENGINE_ERROR,
            };
        }
        if cause.downcast_ref::<RunnerError>().is_some() {
            return ExitCodes::ENGINE_ERROR;
        }
        if cause.downcast_ref::<DbError>().is_some() {
            return ExitCodes::DATABASE_ERROR;
        }
    }
    ExitCodes::GENERAL_ERROR
}
