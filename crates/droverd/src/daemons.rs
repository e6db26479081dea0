//! Daemon bodies the host can run.
//!
//! Each catalog entry currently runs an idle body: it wakes on its poll
//! interval, logs a heartbeat and returns once a stop is requested.

use std::time::Duration;

use drover_registry::{
    GARBAGE_COLLECTOR_DAEMON, REPOSITORY_PULL_LOCAL_DAEMON, TASKMASTER_DAEMON, TRIGGER_DAEMON,
};
use tracing::{debug, info};

use crate::process::StopFlag;

const DAEMON_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::daemon");

/// Work loop hosted by `droverd`.
pub trait DaemonBody: Sync {
    /// Catalog identifier.
    fn name(&self) -> &'static str;

    /// Runs until `stop` is raised.
    fn run(&self, arguments: &[String], stop: &StopFlag);
}

/// Body that heartbeats on a fixed interval until stopped.
#[derive(Debug)]
pub struct IdleDaemon {
    name: &'static str,
    interval: Duration,
}

impl IdleDaemon {
    #[must_use]
    pub const fn new(name: &'static str, interval: Duration) -> Self {
        Self { name, interval }
    }
}

impl DaemonBody for IdleDaemon {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, arguments: &[String], stop: &StopFlag) {
        info!(
            target: DAEMON_TARGET,
            daemon = self.name,
            ?arguments,
            interval_ms = self.interval.as_millis(),
            "daemon running"
        );
        let mut ticks: u64 = 0;
        while !stop.sleep(self.interval) {
            ticks += 1;
            debug!(target: DAEMON_TARGET, daemon = self.name, ticks, "heartbeat");
        }
        info!(target: DAEMON_TARGET, daemon = self.name, ticks, "stop requested");
    }
}

static CATALOG: [IdleDaemon; 4] = [
    IdleDaemon::new(GARBAGE_COLLECTOR_DAEMON, Duration::from_secs(300)),
    IdleDaemon::new(REPOSITORY_PULL_LOCAL_DAEMON, Duration::from_secs(60)),
    IdleDaemon::new(TASKMASTER_DAEMON, Duration::from_secs(5)),
    IdleDaemon::new(TRIGGER_DAEMON, Duration::from_secs(30)),
];

/// Looks up a body by exact catalog identifier.
#[must_use]
pub fn find_daemon(name: &str) -> Option<&'static dyn DaemonBody> {
    CATALOG
        .iter()
        .find(|daemon| daemon.name == name)
        .map(|daemon| daemon as &'static dyn DaemonBody)
}
