//! docdiff binary.
//!
//! Compares the records of a source and a destination, each an Elasticsearch index or an NDJSON
//! file, and prints one line per created, updated, deleted or unchanged record.

use std::process::ExitCode;

use clap::Parser;
use docdiff_config::shared::DiffConfig;
use docdiff_telemetry::tracing::init_tracing;
use tracing::error;

use crate::args::Args;
use crate::config::load_diff_config;
use crate::core::start_diff_with_config;
use crate::error::{CliError, CliResult};

mod args;
mod config;
mod core;
mod error;

/// Entry point of the `docdiff` binary.
///
/// Parses the flags, loads the configuration, initializes tracing and runs the diff on a
/// multi-threaded runtime. Exits with status 1 on any fault.
fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_diff_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprint!("{}", err.render_report());
            return ExitCode::FAILURE;
        }
    };

    let _log_flusher = match init_tracing(env!("CARGO_BIN_NAME")) {
        Ok(log_flusher) => log_flusher,
        Err(err) => {
            eprint!("{}", CliError::config(err).render_report());
            return ExitCode::FAILURE;
        }
    };

    match run(args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(category = err.category(), "{err}");

            ExitCode::FAILURE
        }
    }
}

fn run(args: Args, config: DiffConfig) -> CliResult<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_diff_with_config(args, config))?;

    Ok(())
}
