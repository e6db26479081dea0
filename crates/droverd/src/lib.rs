//! Host process for drover daemons.
//!
//! `drover` launches `droverd <DAEMON> ... --pid=<dir>` once per daemon. The
//! host resolves the daemon body from the static catalog, optionally detaches
//! from the terminal, installs telemetry, then announces itself: a PID record
//! in the local PID directory and a `Running` entry in the shared registry.
//! The body runs until SIGINT (or another polite termination signal) raises
//! the stop flag. On the way out the host removes its PID record and marks its
//! registry entry `Exited`.
//!
//! A SIGKILL bypasses that cleanup; `drover stop` removes the PID record
//! itself in that case.

mod cli;
pub mod daemons;
mod process;
mod telemetry;

pub use cli::HostArgs;
pub use daemons::{DaemonBody, IdleDaemon, find_daemon};
pub use process::{
    ConfigLoader, DaemonizeError, Daemonizer, HostDeps, HostError, STOP_CHECK_INTERVAL,
    ShutdownError, SignalStopSource, StaticConfigLoader, StopFlag, StopSource, SystemConfigLoader,
    SystemDaemonizer, run_host, run_host_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle, TelemetrySettings};

#[cfg(test)]
mod tests;
