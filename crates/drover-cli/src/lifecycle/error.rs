//! Error types for daemon lifecycle operations.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use drover_config::ControlDirectoryError;
use drover_registry::RegistryError;
use thiserror::Error;

use super::resolver::ResolveError;

/// Errors raised while executing lifecycle commands.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(
        "drover start: Unable to start daemons because daemons are already running.\n\
         You can view running daemons with 'drover status'.\n\
         You can stop running daemons with 'drover stop'.\n\
         You can use 'drover restart' to stop all daemons before starting new daemons."
    )]
    DaemonsAlreadyRunning,
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    ControlDirectory(#[from] ControlDirectoryError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("the PID directory '{}' does not exist", .path.display())]
    PidDirectoryMissing { path: PathBuf },
    #[error("the PID directory '{}' is not a directory", .path.display())]
    PidDirectoryNotDirectory { path: PathBuf },
    #[error("the PID directory '{}' is not writable by this user", .path.display())]
    PidDirectoryNotWritable { path: PathBuf },
    #[error("failed to inspect the PID directory '{}': {source}", .path.display())]
    PidDirectoryInspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn daemon host binary '{binary:?}': {source}")]
    LaunchDaemon {
        binary: OsString,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for daemon host '{binary:?}': {source}")]
    MonitorChild {
        binary: OsString,
        #[source]
        source: io::Error,
    },
    #[error("failed to send {signal} to daemon pid {pid}: {source}")]
    SignalFailed {
        pid: u32,
        signal: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("failed to adjust the SIGINT disposition: {source}")]
    SignalDisposition {
        #[source]
        source: io::Error,
    },
    #[error("failed to write lifecycle output: {0}")]
    Io(#[source] io::Error),
    #[cfg(not(unix))]
    #[error("this platform does not support daemon lifecycle signalling; drover requires a Unix host")]
    UnsupportedPlatform,
}
