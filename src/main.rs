//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `cdn_survey` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Ctrl-C handling
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use std::process;
use tokio_util::sync::CancellationToken;

use cdn_survey::app::print_run_summary;
use cdn_survey::initialization::init_logger_with;
use cdn_survey::{run_measurement, run_site_survey, Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    // Completed lines are flushed as they are written, so an interrupted run
    // keeps its partial output.
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping workers");
                cancel.cancel();
            }
        }
    });

    let network = cli.network_config();
    let outcome = match &cli.command {
        Command::Sites(args) => run_site_survey(&network, args, cancel).await,
        Command::Measure(args) => run_measurement(&network, args, cancel).await,
    };

    match outcome {
        Ok(summary) => {
            print_run_summary(&summary);
            Ok(())
        }
        Err(e) => {
            eprintln!("cdn_survey error: {:#}", e);
            process::exit(1);
        }
    }
}
