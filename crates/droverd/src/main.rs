//! Entry point for the `droverd` daemon host.

use std::io::{self, Write};
use std::process::ExitCode;

use droverd::HostError;

fn main() -> ExitCode {
    match droverd::run_host(std::env::args_os()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(HostError::Usage(error)) => {
            let code = if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            match error.print() {
                Ok(()) => code,
                Err(_) => ExitCode::FAILURE,
            }
        }
        Err(error) => {
            // Nothing useful remains to do if stderr itself is gone.
            drop(writeln!(io::stderr().lock(), "droverd: {error}"));
            ExitCode::FAILURE
        }
    }
}
