//! Scripted stand-ins for processes, time and spawning.
//!
//! The stop sequence polls liveness against a clock; these doubles let tests
//! decide how each process reacts to signals and advance time instantly.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::lifecycle::{
    Clock, LaunchPlan, LifecycleError, ProcessControl, SignalOutcome, Spawner, StopSignal,
};

/// Wall-clock seconds the fake clock starts at.
pub(crate) const FAKE_EPOCH_SECONDS: u64 = 1_700_000_000;

/// Clock whose `sleep` advances time without blocking.
pub(crate) struct FakeClock {
    origin: Instant,
    elapsed: Cell<Duration>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
        }
    }
}

impl FakeClock {
    pub(crate) fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn sleep(&self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
    }

    fn unix_seconds(&self) -> Result<u64, LifecycleError> {
        Ok(FAKE_EPOCH_SECONDS + self.elapsed.get().as_secs())
    }
}

/// How a fake process reacts to SIGINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behaviour {
    /// Exits as soon as it is interrupted.
    Cooperative,
    /// Keeps running for this many liveness probes after SIGINT.
    Lingering(u32),
    /// Ignores SIGINT; only SIGKILL ends it.
    Stubborn,
}

#[derive(Debug, Clone, Copy)]
struct FakeProcess {
    behaviour: Behaviour,
    interrupted: bool,
}

/// Process table driven by [`Behaviour`] scripts.
#[derive(Default)]
pub(crate) struct FakeProcesses {
    live: RefCell<BTreeMap<u32, FakeProcess>>,
    signals: RefCell<Vec<(u32, StopSignal)>>,
}

impl FakeProcesses {
    pub(crate) fn spawn(&self, pid: u32, behaviour: Behaviour) {
        self.live.borrow_mut().insert(
            pid,
            FakeProcess {
                behaviour,
                interrupted: false,
            },
        );
    }

    pub(crate) fn signals(&self) -> Vec<(u32, StopSignal)> {
        self.signals.borrow().clone()
    }

    pub(crate) fn signals_to(&self, pid: u32) -> Vec<StopSignal> {
        self.signals
            .borrow()
            .iter()
            .filter(|(target, _)| *target == pid)
            .map(|(_, signal)| *signal)
            .collect()
    }

    pub(crate) fn is_live(&self, pid: u32) -> bool {
        self.live.borrow().contains_key(&pid)
    }
}

impl ProcessControl for FakeProcesses {
    fn is_alive(&self, pid: u32) -> Result<bool, LifecycleError> {
        let mut live = self.live.borrow_mut();
        let Some(process) = live.get_mut(&pid) else {
            return Ok(false);
        };
        if process.interrupted {
            if let Behaviour::Lingering(remaining) = process.behaviour {
                if remaining == 0 {
                    live.remove(&pid);
                    return Ok(false);
                }
                process.behaviour = Behaviour::Lingering(remaining - 1);
            }
        }
        Ok(true)
    }

    fn signal(&self, pid: u32, signal: StopSignal) -> Result<SignalOutcome, LifecycleError> {
        self.signals.borrow_mut().push((pid, signal));
        let mut live = self.live.borrow_mut();
        let Some(process) = live.get_mut(&pid) else {
            return Ok(SignalOutcome::NoSuchProcess);
        };
        match (signal, process.behaviour) {
            (StopSignal::Kill, _) | (StopSignal::Interrupt, Behaviour::Cooperative) => {
                live.remove(&pid);
            }
            (StopSignal::Interrupt, _) => process.interrupted = true,
        }
        Ok(SignalOutcome::Delivered)
    }
}

/// Spawner recording every plan instead of starting processes.
#[derive(Default)]
pub(crate) struct RecordingSpawner {
    detached: RefCell<Vec<LaunchPlan>>,
    attached: RefCell<Vec<LaunchPlan>>,
    debug_exit: Cell<Option<i32>>,
}

impl RecordingSpawner {
    pub(crate) fn set_debug_exit(&self, code: Option<i32>) {
        self.debug_exit.set(code);
    }

    pub(crate) fn detached(&self) -> Vec<LaunchPlan> {
        self.detached.borrow().clone()
    }

    pub(crate) fn attached(&self) -> Vec<LaunchPlan> {
        self.attached.borrow().clone()
    }

    /// Daemon identifiers of every launch, detached and attached.
    pub(crate) fn launched_daemons(&self) -> Vec<String> {
        self.detached
            .borrow()
            .iter()
            .chain(self.attached.borrow().iter())
            .map(|plan| plan.daemon.clone())
            .collect()
    }
}

impl Spawner for RecordingSpawner {
    fn spawn_detached(&self, plan: &LaunchPlan) -> Result<(), LifecycleError> {
        self.detached.borrow_mut().push(plan.clone());
        Ok(())
    }

    fn run_attached(&self, plan: &LaunchPlan) -> Result<Option<i32>, LifecycleError> {
        self.attached.borrow_mut().push(plan.clone());
        Ok(self.debug_exit.get())
    }
}
