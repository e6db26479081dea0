//! Lifecycle management for `droverd` hosts.
//!
//! This module is split into focused submodules so each concern remains small and
//! testable:
//! - [`types`] defines the user-facing command models and IO helpers.
//! - [`error`] captures the error surface exposed to the CLI.
//! - [`resolver`] maps operator-supplied fragments to catalog daemons.
//! - [`discovery`] merges local PID records with the shared registry.
//! - [`processes`] wraps liveness probes, signals and time.
//! - [`launcher`] builds and spawns daemon host invocations.
//! - [`interrupt`] suppresses SIGINT while a debug daemon runs attached.
//! - [`shutdown`] implements the SIGINT, grace window and SIGKILL sequence.
//! - [`report`] renders the status table.
//! - [`controller`] implements the high-level command flows.

mod controller;
mod discovery;
mod error;
mod interrupt;
mod launcher;
mod processes;
mod report;
mod resolver;
mod shutdown;
mod types;

pub use controller::{Collaborators, LifecycleController, SystemLifecycle};
pub use discovery::{DaemonDiscovery, DaemonReference};
pub use error::LifecycleError;
pub use launcher::{DAEMON_BINARY_ENV, DaemonLauncher, LaunchMode, LaunchPlan, Spawner};
pub use processes::{Clock, ProcessControl, SignalOutcome, StopSignal};
pub use resolver::ResolveError;
pub use shutdown::{STOP_GRACE_PERIOD, STOP_POLL_INTERVAL};
pub use types::{LifecycleCommand, LifecycleContext, LifecycleOutput};
