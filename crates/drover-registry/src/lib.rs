//! Shared daemon state for the drover supervisor and its daemon host.
//!
//! Three stores live here:
//!
//! - the registry ([`FileRegistry`]), where each daemon host publishes a
//!   [`DaemonRecord`] describing itself and keeps its status current;
//! - the task lease table ([`FileLeaseTable`]), which the supervisor clamps
//!   when it restarts the fleet;
//! - host-local PID records ([`list_local`], [`write_pid_record`]), which the
//!   supervisor uses to find and signal daemons on this machine.
//!
//! The registry and lease table are expected to sit on storage shared by every
//! host. PID records are strictly local.

mod catalog;
mod error;
mod files;
mod leases;
mod pid_records;
mod record;
mod store;

pub use catalog::{
    DAEMON_CLASSES, GARBAGE_COLLECTOR_DAEMON, REPOSITORY_PULL_LOCAL_DAEMON, TASKMASTER_DAEMON,
    TRIGGER_DAEMON,
};
pub use error::RegistryError;
pub use leases::{FileLeaseTable, LeaseRow, LeaseStore, clamp_active_leases};
pub use pid_records::{
    PidRecord, PidRecordContents, list_local, pid_record_path, probe_liveness, remove_pid_record,
    validate_pid, write_pid_record,
};
pub use record::{
    DaemonId, DaemonRecord, DaemonStatus, local_hostname, unix_millis_now, unix_seconds_now,
};
pub use store::{DaemonRegistry, FileRegistry};

/// Tracing target for registry diagnostics.
pub(crate) const REGISTRY_TARGET: &str = "drover_registry";
