//! Error surface for registry, lease and PID record access.

use std::io;
use std::path::PathBuf;
use std::time::SystemTimeError;

use thiserror::Error;

/// Errors raised while reading or writing shared daemon state.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A registry or lease directory could not be created.
    #[error("failed to prepare registry directory {path:?}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Listing a directory failed.
    #[error("failed to list directory {path:?}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Reading a persisted file failed.
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A persisted file contained invalid JSON.
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Writing a persisted file failed.
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Removing a PID record failed for a reason other than absence.
    #[error("failed to remove pid record {path:?}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Serialising a record failed.
    #[error("failed to serialise record: {0}")]
    Serialise(#[source] serde_json::Error),
    /// A daemon id holds characters that cannot appear in a registry file name.
    #[error("daemon id {id:?} is not a valid registry identifier")]
    InvalidDaemonId { id: String },
    /// The pid cannot address a single process.
    #[error("invalid pid {pid}: {reason}")]
    InvalidPid { pid: u32, reason: &'static str },
    /// The OS refused a liveness probe for an unexpected reason.
    #[cfg(unix)]
    #[error("failed to probe process {pid}: {source}")]
    Probe {
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },
    /// The local hostname could not be determined.
    #[cfg(unix)]
    #[error("failed to determine local hostname: {0}")]
    Hostname(#[source] nix::errno::Errno),
    /// The system clock reported a time before the Unix epoch.
    #[error("system clock is set before the Unix epoch: {0}")]
    Clock(#[source] SystemTimeError),
    /// The platform cannot inspect or signal processes.
    #[cfg(not(unix))]
    #[error("this platform does not support process control; drover requires a Unix host")]
    UnsupportedPlatform,
}
