//! RIPA stop loader binary.
//!
//! Reads a stops CSV file, recreates the configured index and loads one document per row.
//! Exits with a non-zero status when any row or document fails.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ripa_telemetry::tracing::init_tracing;
use tracing::{error, info};

use crate::config::load_loader_config;
use crate::core::run_loader;
use crate::error::{LoaderError, LoaderResult};

mod config;
mod core;
mod error;

/// Loads RIPA stop records from a CSV file into a document index.
#[derive(Debug, Parser)]
#[command(name = "ripa-loader", version, about)]
struct Args {
    /// CSV file with one row per person per stop.
    source: PathBuf,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> LoaderResult<()> {
    let args = Args::parse();

    let loader_config = load_loader_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME")).map_err(LoaderError::config)?;

    let summary = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run_loader(loader_config, &args.source))
        .inspect_err(|err| error!("{err}"))?;

    info!(
        documents_written = summary.documents_written,
        rows_skipped = summary.rows_skipped,
        batches = summary.batches,
        "loader finished"
    );

    Ok(())
}
