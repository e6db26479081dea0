//! Task queue lease table.
//!
//! Workers take leases on queued tasks. When the supervisor restarts the
//! fleet it clamps every outstanding lease to "now" so the new workers can
//! pick the tasks up immediately instead of waiting for stale leases to lapse.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::RegistryError;
use crate::files::atomic_write;

/// One lease held on a queued task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRow {
    pub task_id: u64,
    #[serde(default)]
    pub owner: Option<String>,
    /// Seconds since the Unix epoch; `None` means no lease.
    #[serde(default)]
    pub lease_expires: Option<u64>,
}

/// Bulk lease reset.
pub trait LeaseStore {
    /// Sets `lease_expires = now` on every row expiring after `now`.
    ///
    /// Returns the number of rows changed.
    fn free_active_leases(&self, now: u64) -> Result<usize, RegistryError>;
}

/// Clamps future expiries in `rows` to `now`, returning how many changed.
pub fn clamp_active_leases(rows: &mut [LeaseRow], now: u64) -> usize {
    let mut freed = 0;
    for row in rows {
        if row.lease_expires.is_some_and(|expires| expires > now) {
            row.lease_expires = Some(now);
            freed += 1;
        }
    }
    freed
}

/// Lease table persisted as a JSON array in `<root>/leases.json`.
#[derive(Debug, Clone)]
pub struct FileLeaseTable {
    path: PathBuf,
}

impl FileLeaseTable {
    /// Opens the table under `root`. A missing file is an empty table.
    ///
    /// # Errors
    ///
    /// Fails when `root` cannot be created.
    pub fn open(root: &Path) -> Result<Self, RegistryError> {
        fs::create_dir_all(root).map_err(|source| RegistryError::CreateDirectory {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: root.join("leases.json"),
        })
    }

    /// Reads every row.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed.
    pub fn rows(&self) -> Result<Vec<LeaseRow>, RegistryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RegistryError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| RegistryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Replaces the whole table.
    ///
    /// # Errors
    ///
    /// Fails when the table cannot be written.
    pub fn replace(&self, rows: &[LeaseRow]) -> Result<(), RegistryError> {
        let mut payload = serde_json::to_vec_pretty(rows).map_err(RegistryError::Serialise)?;
        payload.push(b'\n');
        atomic_write(&self.path, &payload).map_err(|source| RegistryError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl LeaseStore for FileLeaseTable {
    fn free_active_leases(&self, now: u64) -> Result<usize, RegistryError> {
        let mut rows = self.rows()?;
        let freed = clamp_active_leases(&mut rows, now);
        if freed > 0 {
            self.replace(&rows)?;
        }
        Ok(freed)
    }
}
