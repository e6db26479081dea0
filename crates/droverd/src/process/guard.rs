//! Announces a hosted daemon to the supervisor and retracts it on exit.

use std::path::{Path, PathBuf};

use drover_registry::{
    DaemonId, DaemonRecord, DaemonRegistry, DaemonStatus, PidRecordContents, RegistryError,
    local_hostname, remove_pid_record, unix_millis_now, write_pid_record,
};
use tracing::{info, warn};

use super::PROCESS_TARGET;

/// What the host knows about the daemon it is about to run.
#[derive(Debug, Clone)]
pub(crate) struct Registration<'a> {
    pub daemon: &'a str,
    pub pid: u32,
    pub argv: Vec<String>,
    pub explicit_argv: Vec<String>,
}

/// Holds the PID record and registry entry of a running daemon.
///
/// Dropping the guard removes the PID record and marks the entry exited.
pub(crate) struct RegistrationGuard<'a> {
    registry: &'a dyn DaemonRegistry,
    pid_file: PathBuf,
    id: DaemonId,
}

impl<'a> RegistrationGuard<'a> {
    pub(crate) fn acquire(
        pid_directory: &Path,
        registry: &'a dyn DaemonRegistry,
        registration: Registration<'_>,
    ) -> Result<Self, RegistryError> {
        let host = local_hostname()?;
        let registered_at = unix_millis_now()?;
        let record = DaemonRecord {
            id: DaemonId::new(&host, registration.pid, registered_at),
            daemon: registration.daemon.to_owned(),
            host,
            pid: registration.pid,
            argv: registration.argv,
            explicit_argv: registration.explicit_argv,
            status: DaemonStatus::Running,
            registered_at,
        };
        registry.register(&record)?;
        let pid_file = write_pid_record(
            pid_directory,
            &PidRecordContents {
                pid: record.pid,
                host: record.host.clone(),
                daemon: record.daemon.clone(),
                daemon_id: record.id.clone(),
            },
        )?;
        info!(
            target: PROCESS_TARGET,
            pid = record.pid,
            daemon = %record.daemon,
            id = %record.id,
            file = %pid_file.display(),
            "daemon registered"
        );
        Ok(Self {
            registry,
            pid_file,
            id: record.id,
        })
    }

    pub(crate) fn id(&self) -> &DaemonId {
        &self.id
    }

    pub(crate) fn pid_file(&self) -> &Path {
        &self.pid_file
    }
}

impl Drop for RegistrationGuard<'_> {
    fn drop(&mut self) {
        if let Err(error) = remove_pid_record(&self.pid_file) {
            warn!(
                target: PROCESS_TARGET,
                file = %self.pid_file.display(),
                error = %error,
                "failed to remove pid record"
            );
        }
        match self.registry.update_status(&self.id, DaemonStatus::Exited) {
            Ok(true) => info!(target: PROCESS_TARGET, id = %self.id, "daemon marked exited"),
            Ok(false) => warn!(
                target: PROCESS_TARGET,
                id = %self.id,
                "registry entry vanished before exit"
            ),
            Err(error) => warn!(
                target: PROCESS_TARGET,
                id = %self.id,
                error = %error,
                "failed to mark daemon exited"
            ),
        }
    }
}
