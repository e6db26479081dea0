//! OS process and clock seams used by the lifecycle controller.
//!
//! The stop sequence is a timed loop over liveness probes and signals. Both
//! sides sit behind traits so tests can script process exits and advance time
//! without sleeping.

use std::thread;
use std::time::{Duration, Instant};

use drover_registry::unix_seconds_now;

use super::error::LifecycleError;

/// Signals the supervisor sends while stopping daemons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// Polite request to finish up and exit.
    Interrupt,
    /// Unconditional termination.
    Kill,
}

impl StopSignal {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Kill => "SIGKILL",
        }
    }
}

/// Result of delivering a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Delivered,
    /// The process was already gone.
    NoSuchProcess,
}

/// Liveness probing and signalling of local processes.
pub trait ProcessControl {
    /// Whether `pid` names a live process. Processes owned by other users
    /// count as alive.
    fn is_alive(&self, pid: u32) -> Result<bool, LifecycleError>;

    /// Sends `signal` to `pid`.
    fn signal(&self, pid: u32, signal: StopSignal) -> Result<SignalOutcome, LifecycleError>;
}

/// Time source for the shutdown grace window and lease bookkeeping.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
    /// Wall-clock seconds since the Unix epoch.
    fn unix_seconds(&self) -> Result<u64, LifecycleError>;
}

/// Probes and signals real processes through `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

#[cfg(unix)]
impl ProcessControl for SystemProcesses {
    fn is_alive(&self, pid: u32) -> Result<bool, LifecycleError> {
        drover_registry::probe_liveness(pid).map_err(LifecycleError::from)
    }

    fn signal(&self, pid: u32, signal: StopSignal) -> Result<SignalOutcome, LifecycleError> {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let raw = drover_registry::validate_pid(pid)?;
        let native = match signal {
            StopSignal::Interrupt => Signal::SIGINT,
            StopSignal::Kill => Signal::SIGKILL,
        };
        match kill(Pid::from_raw(raw), native) {
            Ok(()) => Ok(SignalOutcome::Delivered),
            Err(Errno::ESRCH) => Ok(SignalOutcome::NoSuchProcess),
            Err(errno) => Err(LifecycleError::SignalFailed {
                pid,
                signal: signal.name(),
                source: errno.into(),
            }),
        }
    }
}

#[cfg(not(unix))]
impl ProcessControl for SystemProcesses {
    fn is_alive(&self, _pid: u32) -> Result<bool, LifecycleError> {
        Err(LifecycleError::UnsupportedPlatform)
    }

    fn signal(&self, _pid: u32, _signal: StopSignal) -> Result<SignalOutcome, LifecycleError> {
        Err(LifecycleError::UnsupportedPlatform)
    }
}

/// Real monotonic and wall clocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }

    fn unix_seconds(&self) -> Result<u64, LifecycleError> {
        unix_seconds_now().map_err(LifecycleError::from)
    }
}
