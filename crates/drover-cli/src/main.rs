//! CLI entrypoint for the drover daemon supervisor.
//!
//! The binary delegates to [`drover_cli::run`], which loads configuration,
//! parses the subcommand, and drives the lifecycle controller.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    drover_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
