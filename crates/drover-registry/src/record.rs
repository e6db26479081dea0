//! Registry entries describing daemons on any host.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::RegistryError;

/// Lifecycle status a daemon reports about itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonStatus {
    /// Status has not been reported yet.
    #[default]
    Unknown,
    /// The daemon is running and doing work.
    Running,
    /// The daemon is alive but backing off.
    Wait,
    /// The daemon stopped reporting and is presumed dead.
    Dead,
    /// The daemon exited.
    Exited,
}

impl DaemonStatus {
    /// Whether the registry considers the daemon alive.
    #[must_use]
    pub const fn is_alive(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Lowercase label used in output and on disk.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Running => "running",
            Self::Wait => "wait",
            Self::Dead => "dead",
            Self::Exited => "exited",
        }
    }
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaemonId(String);

impl DaemonId {
    /// Builds the identifier for a daemon registering at `registered_at_ms`.
    ///
    /// Characters outside `[A-Za-z0-9._-]` in the host name are replaced so the
    /// identifier is always a safe file name.
    #[must_use]
    pub fn new(host: &str, pid: u32, registered_at_ms: u64) -> Self {
        let host: String = host
            .chars()
            .map(|c| if is_id_char(c) { c } else { '_' })
            .collect();
        Self(format!("{host}-{pid}-{registered_at_ms}"))
    }

    /// Whether the identifier can name a file inside the registry directory.
    ///
    /// Identifiers read back from disk are untrusted; only the characters
    /// [`DaemonId::new`] produces are accepted, and `.`/`..` are refused.
    #[must_use]
    pub fn is_file_safe(&self) -> bool {
        !self.0.is_empty() && self.0 != "." && self.0 != ".." && self.0.chars().all(is_id_char)
    }

    /// Borrows the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

const fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

impl From<&str> for DaemonId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for DaemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A daemon's entry in the shared registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonRecord {
    pub id: DaemonId,
    /// Catalog identifier of the daemon implementation.
    pub daemon: String,
    pub host: String,
    pub pid: u32,
    /// Full argument vector of the daemon host process.
    pub argv: Vec<String>,
    /// Arguments addressed to the daemon itself.
    #[serde(default)]
    pub explicit_argv: Vec<String>,
    #[serde(default)]
    pub status: DaemonStatus,
    /// Milliseconds since the Unix epoch at registration.
    #[serde(default)]
    pub registered_at: u64,
}

/// Returns this host's name as reported by the OS.
///
/// # Errors
///
/// Fails when the hostname cannot be read.
#[cfg(unix)]
pub fn local_hostname() -> Result<String, RegistryError> {
    let name = nix::unistd::gethostname().map_err(RegistryError::Hostname)?;
    Ok(name.to_string_lossy().into_owned())
}

/// Returns this host's name as reported by the OS.
///
/// # Errors
///
/// Always fails: process control requires a Unix host.
#[cfg(not(unix))]
pub fn local_hostname() -> Result<String, RegistryError> {
    Err(RegistryError::UnsupportedPlatform)
}

/// Milliseconds since the Unix epoch.
///
/// # Errors
///
/// Fails when the system clock is set before the epoch.
pub fn unix_millis_now() -> Result<u64, RegistryError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(RegistryError::Clock)?;
    Ok(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Seconds since the Unix epoch.
///
/// # Errors
///
/// Fails when the system clock is set before the epoch.
pub fn unix_seconds_now() -> Result<u64, RegistryError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(RegistryError::Clock)
}
