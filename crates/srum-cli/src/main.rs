//! SRUM converter CLI.

use std::process::ExitCode;

use clap::Parser;
use srum_cli::logging::init_logging;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command};
use crate::commands::{run_convert, run_rules};
use crate::summary::print_summary;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&cli.log_config()) {
        eprintln!("error: cannot open log output: {error}");
        return ExitCode::FAILURE;
    }
    match run(cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs one subcommand. A conversion that finished with table errors still
/// prints its summary but exits non-zero.
fn run(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Convert(args) => {
            let result = run_convert(&args)?;
            print_summary(&result);
            Ok(if result.has_errors {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Rules => {
            run_rules()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
