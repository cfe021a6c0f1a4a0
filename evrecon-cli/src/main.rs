//! evrecon CLI - command-line interface
//!
//! Reads an event-camera log and writes one reconstructed PNG per frame
//! window. Exits with 0 on success and 1 on any failure.

mod cli;
mod error;
mod run;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;
use error::CliError;

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => return ExitCode::from(informational_exit(e.print())),
        Err(e) => return ExitCode::from(report(Err(CliError::Argument(e)))),
    };

    init_logging(cli.log_level());
    ExitCode::from(report(run::execute(&cli)))
}

/// Log to stderr at the level chosen by `-v`.
fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::new(level))
        .init();
}

/// Exit code after printing help or version text.
fn informational_exit(printed: io::Result<()>) -> u8 {
    match printed {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: failed to write to stdout: {}", e);
            EXIT_FAILURE
        }
    }
}

fn report(result: Result<(), CliError>) -> u8 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            EXIT_FAILURE
        }
    }
}
