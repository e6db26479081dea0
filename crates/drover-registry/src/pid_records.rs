//! Host-local PID records.
//!
//! Every daemon host writes `daemon.<pid>` into the PID directory once it has
//! daemonized. The supervisor enumerates these files to find local daemons and
//! removes them once it has stopped the process. Parsing is tolerant: a file
//! that cannot be read or decoded still shows up so the operator can see and
//! clean it.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::files::{atomic_write, is_temporary};
use crate::record::DaemonId;
use crate::{REGISTRY_TARGET, RegistryError};

const PID_RECORD_PREFIX: &str = "daemon.";

/// Decoded body of a PID record file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidRecordContents {
    pub pid: u32,
    pub host: String,
    pub daemon: String,
    pub daemon_id: DaemonId,
}

/// A PID record as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidRecord {
    file_path: PathBuf,
    contents: Option<PidRecordContents>,
}

impl PidRecord {
    /// Builds a record from an already decoded body.
    #[must_use]
    pub fn new(file_path: PathBuf, contents: Option<PidRecordContents>) -> Self {
        Self {
            file_path,
            contents,
        }
    }

    /// Reads and decodes `path`, keeping only the path when that fails.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(text) => parse_contents(path, &text),
            Err(error) => {
                debug!(
                    target: REGISTRY_TARGET,
                    file = %path.display(),
                    error = %error,
                    "pid record unreadable"
                );
                None
            }
        };
        Self::new(path.to_path_buf(), contents)
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Decoded body, if the file was well formed.
    #[must_use]
    pub fn contents(&self) -> Option<&PidRecordContents> {
        self.contents.as_ref()
    }

    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.contents.as_ref().map(|contents| contents.pid)
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.contents.as_ref().map(|contents| contents.host.as_str())
    }

    #[must_use]
    pub fn daemon(&self) -> Option<&str> {
        self.contents.as_ref().map(|contents| contents.daemon.as_str())
    }

    #[must_use]
    pub fn daemon_id(&self) -> Option<&DaemonId> {
        self.contents.as_ref().map(|contents| &contents.daemon_id)
    }
}

fn parse_contents(path: &Path, text: &str) -> Option<PidRecordContents> {
    let contents: PidRecordContents = match serde_json::from_str(text) {
        Ok(contents) => contents,
        Err(error) => {
            debug!(
                target: REGISTRY_TARGET,
                file = %path.display(),
                error = %error,
                "pid record malformed"
            );
            return None;
        }
    };
    if let Err(error) = validate_pid(contents.pid) {
        debug!(
            target: REGISTRY_TARGET,
            file = %path.display(),
            error = %error,
            "pid record names an unusable pid"
        );
        return None;
    }
    if !contents.daemon_id.is_file_safe() {
        debug!(
            target: REGISTRY_TARGET,
            file = %path.display(),
            daemon_id = %contents.daemon_id,
            "pid record names an unusable daemon id"
        );
        return None;
    }
    Some(contents)
}

/// Rejects pids that would address a process group or overflow `pid_t`.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidPid`] for zero or values above `i32::MAX`.
pub fn validate_pid(pid: u32) -> Result<i32, RegistryError> {
    if pid == 0 {
        return Err(RegistryError::InvalidPid {
            pid,
            reason: "pid 0 addresses the whole process group",
        });
    }
    i32::try_from(pid).map_err(|_| RegistryError::InvalidPid {
        pid,
        reason: "pid exceeds the platform pid range",
    })
}

/// Path of the record for `pid` inside `pid_directory`.
#[must_use]
pub fn pid_record_path(pid_directory: &Path, pid: u32) -> PathBuf {
    pid_directory.join(format!("{PID_RECORD_PREFIX}{pid}"))
}

/// Lists every regular file in `pid_directory` as a PID record.
///
/// Decoded records come first, ordered by pid; undecodable files follow in
/// path order.
///
/// # Errors
///
/// Fails when the directory exists but cannot be listed. A missing directory
/// yields an empty list.
pub fn list_local(pid_directory: &Path) -> Result<Vec<PidRecord>, RegistryError> {
    let entries = match fs::read_dir(pid_directory) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(RegistryError::ReadDirectory {
                path: pid_directory.to_path_buf(),
                source,
            });
        }
    };

    let mut records = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RegistryError::ReadDirectory {
            path: pid_directory.to_path_buf(),
            source,
        })?;
        if entry.file_name().to_str().is_some_and(is_temporary) {
            continue;
        }
        let is_file = entry
            .file_type()
            .map(|file_type| file_type.is_file())
            .unwrap_or(false);
        if is_file {
            records.push(PidRecord::load(&entry.path()));
        }
    }
    records.sort_by(compare_records);
    Ok(records)
}

fn compare_records(left: &PidRecord, right: &PidRecord) -> Ordering {
    match (left.pid(), right.pid()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| left.file_path.cmp(&right.file_path))
}

/// Writes the record for `contents.pid` into `pid_directory`.
///
/// # Errors
///
/// Fails when the pid is unusable or the file cannot be written.
pub fn write_pid_record(
    pid_directory: &Path,
    contents: &PidRecordContents,
) -> Result<PathBuf, RegistryError> {
    validate_pid(contents.pid)?;
    let path = pid_record_path(pid_directory, contents.pid);
    let mut payload = serde_json::to_vec(contents).map_err(RegistryError::Serialise)?;
    payload.push(b'\n');
    atomic_write(&path, &payload).map_err(|source| RegistryError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Removes a PID record. A file that is already gone counts as removed.
///
/// # Errors
///
/// Fails when the file exists but cannot be removed.
pub fn remove_pid_record(path: &Path) -> Result<(), RegistryError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(RegistryError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Asks the OS whether `pid` names a live process.
///
/// A process owned by another user still counts as alive.
///
/// # Errors
///
/// Fails for unusable pids and for unexpected probe failures.
#[cfg(unix)]
pub fn probe_liveness(pid: u32) -> Result<bool, RegistryError> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let raw = validate_pid(pid)?;
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(source) => Err(RegistryError::Probe { pid, source }),
    }
}

/// Asks the OS whether `pid` names a live process.
///
/// # Errors
///
/// Always fails: process control requires a Unix host.
#[cfg(not(unix))]
pub fn probe_liveness(pid: u32) -> Result<bool, RegistryError> {
    validate_pid(pid)?;
    Err(RegistryError::UnsupportedPlatform)
}
