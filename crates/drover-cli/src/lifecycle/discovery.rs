//! Unified view of local PID records and registry entries.

use std::path::Path;

use drover_registry::{
    DaemonId, DaemonRecord, DaemonRegistry, DaemonStatus, PidRecord, RegistryError, list_local,
};

use super::error::LifecycleError;
use super::processes::ProcessControl;

/// A daemon known to the supervisor.
///
/// Local references come from a PID record on this host and carry the
/// registry entry it points at, when that resolves. Remote references come
/// from the registry alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonReference {
    pid_record: Option<PidRecord>,
    record: Option<DaemonRecord>,
}

impl DaemonReference {
    #[must_use]
    pub fn local(pid_record: PidRecord, record: Option<DaemonRecord>) -> Self {
        Self {
            pid_record: Some(pid_record),
            record,
        }
    }

    #[must_use]
    pub fn remote(record: DaemonRecord) -> Self {
        Self {
            pid_record: None,
            record: Some(record),
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        self.pid_record.is_some()
    }

    /// The process id, from the PID record for local daemons.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        match &self.pid_record {
            Some(pid_record) => pid_record.pid(),
            None => self.record.as_ref().map(|record| record.pid),
        }
    }

    /// Catalog name of the daemon, when either source knows it.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.pid_record
            .as_ref()
            .and_then(PidRecord::daemon)
            .or_else(|| self.record.as_ref().map(|record| record.daemon.as_str()))
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.record
            .as_ref()
            .map(|record| record.host.as_str())
            .or_else(|| self.pid_record.as_ref().and_then(PidRecord::host))
    }

    #[must_use]
    pub fn pid_file(&self) -> Option<&Path> {
        self.pid_record.as_ref().map(PidRecord::file_path)
    }

    #[must_use]
    pub fn record(&self) -> Option<&DaemonRecord> {
        self.record.as_ref()
    }

    /// Registry id this reference is known under.
    #[must_use]
    pub fn daemon_id(&self) -> Option<&DaemonId> {
        self.record
            .as_ref()
            .map(|record| &record.id)
            .or_else(|| self.pid_record.as_ref().and_then(PidRecord::daemon_id))
    }

    /// Whether the OS reports this daemon's process alive right now.
    ///
    /// Only the local PID counts: registry status never makes a daemon
    /// running, and remote daemons are never running from this host's view.
    pub fn is_running(&self, processes: &dyn ProcessControl) -> Result<bool, LifecycleError> {
        match self.pid_record.as_ref().and_then(PidRecord::pid) {
            Some(pid) => processes.is_alive(pid),
            None => Ok(false),
        }
    }

    /// Overwrites the registry status when the entry resolves.
    pub fn update_status(
        &self,
        registry: &dyn DaemonRegistry,
        status: DaemonStatus,
    ) -> Result<bool, LifecycleError> {
        match self.daemon_id() {
            Some(id) => registry.update_status(id, status).map_err(Into::into),
            None => Ok(false),
        }
    }
}

/// Merges host-local PID records with the shared registry.
pub struct DaemonDiscovery<'a> {
    pid_directory: &'a Path,
    registry: &'a dyn DaemonRegistry,
}

impl<'a> DaemonDiscovery<'a> {
    #[must_use]
    pub fn new(pid_directory: &'a Path, registry: &'a dyn DaemonRegistry) -> Self {
        Self {
            pid_directory,
            registry,
        }
    }

    /// Every PID record on this host, whether or not its process still runs.
    pub fn load_running_daemons(&self) -> Result<Vec<DaemonReference>, LifecycleError> {
        list_local(self.pid_directory)?
            .into_iter()
            .map(|pid_record| {
                let record = self.resolve(&pid_record)?;
                Ok(DaemonReference::local(pid_record, record))
            })
            .collect()
    }

    /// Local daemons followed by running registry entries not represented
    /// locally.
    pub fn load_all_running_daemons(&self) -> Result<Vec<DaemonReference>, LifecycleError> {
        let mut daemons = self.load_running_daemons()?;
        let local_ids: Vec<DaemonId> = daemons
            .iter()
            .filter_map(|daemon| daemon.record().map(|record| record.id.clone()))
            .collect();
        let remote = self.registry.alive_excluding(&local_ids)?;
        daemons.extend(remote.into_iter().map(DaemonReference::remote));
        Ok(daemons)
    }

    fn resolve(&self, pid_record: &PidRecord) -> Result<Option<DaemonRecord>, LifecycleError> {
        let Some(id) = pid_record.daemon_id() else {
            return Ok(None);
        };
        match self.registry.find(id) {
            Ok(record) => Ok(record),
            Err(RegistryError::Parse { .. }) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}
