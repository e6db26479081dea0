//! Control directories shared by the supervisor and the daemon host.
//!
//! The PID directory holds one record per locally running daemon and the log
//! directory holds the consolidated daemon log. Both must exist before any
//! daemon can be tracked, so failing to create either one is fatal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Config;
use crate::defaults::DAEMON_LOG_FILE;

/// Canonical control directories derived from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDirectories {
    pid_directory: PathBuf,
    log_directory: PathBuf,
}

impl ControlDirectories {
    /// Ensures both control directories exist, creating them when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ControlDirectoryError::Unavailable`] naming the first
    /// directory that could not be created.
    pub fn prepare(config: &Config) -> Result<Self, ControlDirectoryError> {
        let pid_directory = ensure_control_directory(config.pid_directory().as_std_path())?;
        let log_directory = ensure_control_directory(config.log_directory().as_std_path())?;
        Ok(Self {
            pid_directory,
            log_directory,
        })
    }

    /// Directory holding PID records.
    #[must_use]
    pub fn pid_directory(&self) -> &Path {
        self.pid_directory.as_path()
    }

    /// Directory holding the consolidated daemon log.
    #[must_use]
    pub fn log_directory(&self) -> &Path {
        self.log_directory.as_path()
    }

    /// Path of the shared log file daemons append to.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.log_directory.join(DAEMON_LOG_FILE)
    }
}

/// Ensures `path` exists, creating it and any missing parents.
///
/// # Errors
///
/// Returns [`ControlDirectoryError::Unavailable`] when the directory is
/// absent and cannot be created.
pub fn ensure_control_directory(path: &Path) -> Result<PathBuf, ControlDirectoryError> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    fs::create_dir_all(path).map_err(|source| ControlDirectoryError::Unavailable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}

/// Errors raised while preparing control directories.
#[derive(Debug, Error)]
pub enum ControlDirectoryError {
    /// The directory is missing and could not be created.
    #[error(
        "drover requires the directory '{}' to exist, but it does not exist and could not be created ({source}); create this directory or update 'pid_directory' / 'log_directory' in your configuration to point to an existing directory",
        .path.display()
    )]
    Unavailable {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
