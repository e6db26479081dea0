//! Implements the daemonisation backend for the `droverd` process.

use daemonize_me::Daemon;
use std::ffi::OsStr;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Abstraction over daemonisation strategies.
pub trait Daemonizer {
    /// Detaches the process into the background.
    fn daemonize(&self, daemon: &str) -> Result<(), DaemonizeError>;
}

/// Errors surfaced by the daemonisation backend.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// System-level daemonisation failed.
    #[error("{0}")]
    System(#[from] daemonize_me::DaemonError),
}

/// Daemoniser that delegates to `daemonize-me`.
#[derive(Debug, Default)]
pub struct SystemDaemonizer;

impl Daemonizer for SystemDaemonizer {
    fn daemonize(&self, daemon: &str) -> Result<(), DaemonizeError> {
        info!(
            target: PROCESS_TARGET,
            daemon,
            "daemonising into background"
        );
        Daemon::new()
            .work_dir("/")
            .name(OsStr::new(env!("CARGO_PKG_NAME")))
            .start()?;
        Ok(())
    }
}
