//! Stop requests delivered by signal.
//!
//! `drover stop` sends SIGINT and, after its grace window, SIGKILL. The host
//! turns SIGINT (and the other polite termination signals) into a flag the
//! daemon body polls between units of work.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Upper bound on how long a stop request can go unnoticed while idling.
pub const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Errors reported while installing signal handlers.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Wires a [`StopFlag`] to whatever delivers stop requests.
pub trait StopSource {
    /// Arranges for `flag` to be raised when a stop is requested.
    fn install(&self, flag: &StopFlag) -> Result<(), ShutdownError>;
}

/// Raises the flag on SIGINT, SIGTERM, SIGQUIT and SIGHUP.
#[derive(Debug, Default)]
pub struct SignalStopSource;

impl StopSource for SignalStopSource {
    fn install(&self, flag: &StopFlag) -> Result<(), ShutdownError> {
        for signal in [SIGINT, SIGTERM, SIGQUIT, SIGHUP] {
            signal_hook::flag::register(signal, Arc::clone(&flag.raised))
                .map_err(|source| ShutdownError::Install { source })?;
        }
        info!(target: PROCESS_TARGET, "stop signal handlers installed");
        Ok(())
    }
}

/// Shared flag raised when the daemon should stop.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    raised: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` unless a stop is requested first.
    ///
    /// Returns `true` when the flag is raised.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_raised() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            thread::sleep(remaining.min(STOP_CHECK_INTERVAL));
        }
    }
}
