//! `calcwatch`: list calculations on a remote engine and follow their logs.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::exit_codes;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE
            } else {
                exit_codes::SUCCESS
            };
            // --help / --version land here too.
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    // stdout carries the log view.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .init();

    match commands::run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            debug!(error = ?err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::from(commands::exit_code_for(&err))
        }
    }
}
