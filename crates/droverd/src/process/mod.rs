//! Process lifecycle of a hosted daemon.

pub(crate) mod daemonizer;
mod errors;
mod guard;
pub(crate) mod launch;
pub(crate) mod shutdown;

pub use daemonizer::{DaemonizeError, Daemonizer, SystemDaemonizer};
pub use errors::HostError;
pub use launch::{
    ConfigLoader, HostDeps, StaticConfigLoader, SystemConfigLoader, run_host, run_host_with,
};
pub use shutdown::{STOP_CHECK_INTERVAL, ShutdownError, SignalStopSource, StopFlag, StopSource};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
