//! Lifecycle command types and output abstractions.
//!
//! Defines the payloads and IO wrappers shared across lifecycle commands so the
//! controller can remain agnostic of concrete writers.

use std::fmt;
use std::io::Write;

use drover_config::Config;

use super::LifecycleError;
use crate::cli::CliCommand;

/// Supported lifecycle commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleCommand {
    List,
    Status,
    Start { keep_leases: bool },
    Stop { pids: Vec<String> },
    Restart { keep_leases: bool },
    Launch { daemon: String, arguments: Vec<String> },
    Debug { daemon: String, arguments: Vec<String> },
}

impl LifecycleCommand {
    /// Subcommand name as typed by the operator.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Status => "status",
            Self::Start { .. } => "start",
            Self::Stop { .. } => "stop",
            Self::Restart { .. } => "restart",
            Self::Launch { .. } => "launch",
            Self::Debug { .. } => "debug",
        }
    }
}

impl fmt::Display for LifecycleCommand {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl From<CliCommand> for LifecycleCommand {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::List => Self::List,
            CliCommand::Status => Self::Status,
            CliCommand::Start { keep_leases } => Self::Start { keep_leases },
            CliCommand::Stop { pids } => Self::Stop { pids },
            CliCommand::Restart { keep_leases } => Self::Restart { keep_leases },
            CliCommand::Launch { daemon, arguments } => Self::Launch { daemon, arguments },
            CliCommand::Debug { daemon, arguments } => Self::Debug { daemon, arguments },
        }
    }
}

/// Shared configuration context available to lifecycle handlers.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleContext<'a> {
    pub config: &'a Config,
}

/// Output handle abstracting over stdout/stderr writers.
///
/// Results go to stdout; progress notes and warnings go to stderr.
pub struct LifecycleOutput<W: Write, E: Write> {
    pub stdout: W,
    pub stderr: E,
}

impl<W: Write, E: Write> LifecycleOutput<W, E> {
    pub fn new(stdout: W, stderr: E) -> Self {
        Self { stdout, stderr }
    }

    pub fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), LifecycleError> {
        self.stdout.write_fmt(args).map_err(LifecycleError::Io)?;
        self.stdout.write_all(b"\n").map_err(LifecycleError::Io)?;
        self.stdout.flush().map_err(LifecycleError::Io)
    }

    pub fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), LifecycleError> {
        self.stderr.write_fmt(args).map_err(LifecycleError::Io)?;
        self.stderr.write_all(b"\n").map_err(LifecycleError::Io)?;
        self.stderr.flush().map_err(LifecycleError::Io)
    }
}
