//! Binary entry point for the `riptide` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match riptide_cli::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            err.print();
            ExitCode::FAILURE
        }
    }
}
