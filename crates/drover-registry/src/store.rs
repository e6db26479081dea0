//! Shared registry of daemon status entries.
//!
//! The registry directory is expected to be reachable from every host that
//! runs daemons. Each entry lives in its own JSON file so registrations from
//! concurrent daemons never contend for a single document, and every update
//! is an atomic file replacement.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::files::{atomic_write, is_temporary};
use crate::record::{DaemonId, DaemonRecord, DaemonStatus};
use crate::{REGISTRY_TARGET, RegistryError};

/// Read/write access to the daemon registry.
pub trait DaemonRegistry {
    /// Inserts or replaces an entry.
    fn register(&self, record: &DaemonRecord) -> Result<(), RegistryError>;

    /// Looks up an entry by id.
    fn find(&self, id: &DaemonId) -> Result<Option<DaemonRecord>, RegistryError>;

    /// Returns alive entries whose ids are not in `excluded`, oldest first.
    fn alive_excluding(&self, excluded: &[DaemonId]) -> Result<Vec<DaemonRecord>, RegistryError>;

    /// Overwrites the status of an entry. Returns `false` if it does not exist.
    fn update_status(&self, id: &DaemonId, status: DaemonStatus) -> Result<bool, RegistryError>;
}

/// Registry persisted as one JSON file per entry under `<root>/daemons`.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    daemons_dir: PathBuf,
}

impl FileRegistry {
    /// Opens the registry rooted at `root`, creating its layout on demand.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created.
    pub fn open(root: &Path) -> Result<Self, RegistryError> {
        let daemons_dir = root.join("daemons");
        fs::create_dir_all(&daemons_dir).map_err(|source| RegistryError::CreateDirectory {
            path: daemons_dir.clone(),
            source,
        })?;
        Ok(Self { daemons_dir })
    }

    /// Every readable entry, ordered by registration time.
    ///
    /// Malformed entries are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Fails when the registry directory cannot be listed.
    pub fn all(&self) -> Result<Vec<DaemonRecord>, RegistryError> {
        let entries =
            fs::read_dir(&self.daemons_dir).map_err(|source| RegistryError::ReadDirectory {
                path: self.daemons_dir.clone(),
                source,
            })?;
        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RegistryError::ReadDirectory {
                path: self.daemons_dir.clone(),
                source,
            })?;
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == "json")
                && !entry.file_name().to_str().is_some_and(is_temporary);
            if !is_record {
                continue;
            }
            match read_record(&path) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(error) => warn!(
                    target: REGISTRY_TARGET,
                    file = %path.display(),
                    error = %error,
                    "skipping unreadable registry entry"
                ),
            }
        }
        records.sort_by(|left, right| {
            left.registered_at
                .cmp(&right.registered_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(records)
    }

    fn record_path(&self, id: &DaemonId) -> Result<PathBuf, RegistryError> {
        if !id.is_file_safe() {
            return Err(RegistryError::InvalidDaemonId {
                id: id.as_str().to_owned(),
            });
        }
        Ok(self.daemons_dir.join(format!("{id}.json")))
    }
}

impl DaemonRegistry for FileRegistry {
    fn register(&self, record: &DaemonRecord) -> Result<(), RegistryError> {
        write_record(&self.record_path(&record.id)?, record)
    }

    fn find(&self, id: &DaemonId) -> Result<Option<DaemonRecord>, RegistryError> {
        read_record(&self.record_path(id)?)
    }

    fn alive_excluding(&self, excluded: &[DaemonId]) -> Result<Vec<DaemonRecord>, RegistryError> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|record| record.status.is_alive() && !excluded.contains(&record.id))
            .collect())
    }

    fn update_status(&self, id: &DaemonId, status: DaemonStatus) -> Result<bool, RegistryError> {
        let path = self.record_path(id)?;
        let Some(mut record) = read_record(&path)? else {
            return Ok(false);
        };
        record.status = status;
        write_record(&path, &record)?;
        Ok(true)
    }
}

fn read_record(path: &Path) -> Result<Option<DaemonRecord>, RegistryError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(RegistryError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn write_record(path: &Path, record: &DaemonRecord) -> Result<(), RegistryError> {
    let mut payload = serde_json::to_vec_pretty(record).map_err(RegistryError::Serialise)?;
    payload.push(b'\n');
    atomic_write(path, &payload).map_err(|source| RegistryError::Write {
        path: path.to_path_buf(),
        source,
    })
}
