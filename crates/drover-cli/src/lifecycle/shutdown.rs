//! Daemon stop sequence.
//!
//! Targets get SIGINT, then a fixed grace window in which the supervisor polls
//! for exits. Whatever survives the window gets exactly one SIGKILL. PID
//! records of every target are removed at the end, whichever path it took.

use std::io::Write;
use std::time::{Duration, Instant};

use drover_registry::{DaemonRegistry, DaemonStatus, remove_pid_record};

use super::discovery::DaemonReference;
use super::error::LifecycleError;
use super::processes::{Clock, ProcessControl, SignalOutcome, StopSignal};
use super::types::LifecycleOutput;

/// How long daemons get to exit after SIGINT.
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(15);
/// Delay between liveness polls during the grace window.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Collaborators the stop sequence drives.
pub struct ShutdownDeps<'a> {
    pub registry: &'a dyn DaemonRegistry,
    pub processes: &'a dyn ProcessControl,
    pub clock: &'a dyn Clock,
}

/// Picks stop targets from the local daemons.
///
/// An empty filter selects every daemon. Filter tokens that are not PIDs, or
/// that name no local daemon, are reported and skipped.
pub fn select_targets<W: Write, E: Write>(
    daemons: Vec<DaemonReference>,
    filter: &[String],
    output: &mut LifecycleOutput<W, E>,
) -> Result<Vec<DaemonReference>, LifecycleError> {
    if filter.is_empty() {
        return Ok(daemons);
    }

    let mut targets: Vec<DaemonReference> = Vec::new();
    for token in filter {
        let Some(pid) = parse_pid(token) else {
            output.stderr_line(format_args!("PID '{token}' is not a valid PID."))?;
            continue;
        };
        match daemons.iter().find(|daemon| daemon.pid() == Some(pid)) {
            Some(daemon) => {
                if !targets.iter().any(|target| target.pid() == Some(pid)) {
                    targets.push(daemon.clone());
                }
            }
            None => output.stderr_line(format_args!(
                "PID '{token}' is not a drover daemon PID. It will not be killed."
            ))?,
        }
    }
    Ok(targets)
}

fn parse_pid(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    token.parse::<u32>().ok().filter(|pid| *pid != 0)
}

/// Stops `targets`, escalating to SIGKILL once [`STOP_GRACE_PERIOD`] has
/// passed since the first signal went out.
///
/// Registry and signal failures for one target are reported on stderr and do
/// not stop the sequence for the others.
pub fn stop_daemons<W: Write, E: Write>(
    targets: &[DaemonReference],
    deps: &ShutdownDeps<'_>,
    output: &mut LifecycleOutput<W, E>,
) -> Result<(), LifecycleError> {
    let deadline = deps.clock.now() + STOP_GRACE_PERIOD;
    let pending = signal_targets(targets, deps, output)?;
    let survivors = await_exits(pending, deadline, deps, output)?;
    kill_survivors(&survivors, deps, output)?;
    remove_records(targets, output)
}

fn signal_targets<'t, W: Write, E: Write>(
    targets: &'t [DaemonReference],
    deps: &ShutdownDeps<'_>,
    output: &mut LifecycleOutput<W, E>,
) -> Result<Vec<(u32, &'t DaemonReference)>, LifecycleError> {
    let mut pending = Vec::new();
    for daemon in targets {
        output.stderr_line(format_args!(
            "Stopping daemon '{}' ({})...",
            daemon.name().unwrap_or("unknown"),
            display_pid(daemon.pid())
        ))?;
        let live_pid = match daemon.pid() {
            Some(pid) if daemon.is_running(deps.processes)? => Some(pid),
            _ => None,
        };
        match live_pid {
            Some(pid) => {
                send_signal(pid, StopSignal::Interrupt, deps, output)?;
                pending.push((pid, daemon));
            }
            None => {
                output.stderr_line(format_args!("Daemon is not running."))?;
                if let Err(error) = daemon.update_status(deps.registry, DaemonStatus::Exited) {
                    output.stderr_line(format_args!("{error}"))?;
                }
            }
        }
    }
    Ok(pending)
}

fn await_exits<'t, W: Write, E: Write>(
    mut pending: Vec<(u32, &'t DaemonReference)>,
    deadline: Instant,
    deps: &ShutdownDeps<'_>,
    output: &mut LifecycleOutput<W, E>,
) -> Result<Vec<(u32, &'t DaemonReference)>, LifecycleError> {
    loop {
        let mut still_running = Vec::with_capacity(pending.len());
        for (pid, daemon) in pending {
            if daemon.is_running(deps.processes)? {
                still_running.push((pid, daemon));
            } else {
                output.stdout_line(format_args!("Daemon {pid} exited normally."))?;
            }
        }
        pending = still_running;
        if pending.is_empty() || deps.clock.now() >= deadline {
            return Ok(pending);
        }
        deps.clock.sleep(STOP_POLL_INTERVAL);
    }
}

fn kill_survivors<W: Write, E: Write>(
    survivors: &[(u32, &DaemonReference)],
    deps: &ShutdownDeps<'_>,
    output: &mut LifecycleOutput<W, E>,
) -> Result<(), LifecycleError> {
    for (pid, _) in survivors {
        output.stderr_line(format_args!("Sending daemon {pid} a SIGKILL."))?;
        send_signal(*pid, StopSignal::Kill, deps, output)?;
    }
    Ok(())
}

/// Delivers `signal`, reporting failures instead of aborting the sequence.
///
/// A process that is already gone needs no signal.
fn send_signal<W: Write, E: Write>(
    pid: u32,
    signal: StopSignal,
    deps: &ShutdownDeps<'_>,
    output: &mut LifecycleOutput<W, E>,
) -> Result<(), LifecycleError> {
    match deps.processes.signal(pid, signal) {
        Ok(SignalOutcome::Delivered | SignalOutcome::NoSuchProcess) => Ok(()),
        Err(error) => output.stderr_line(format_args!("{error}")),
    }
}

fn remove_records<W: Write, E: Write>(
    targets: &[DaemonReference],
    output: &mut LifecycleOutput<W, E>,
) -> Result<(), LifecycleError> {
    for path in targets.iter().filter_map(DaemonReference::pid_file) {
        if let Err(error) = remove_pid_record(path) {
            output.stderr_line(format_args!("{error}"))?;
        }
    }
    Ok(())
}

fn display_pid(pid: Option<u32>) -> String {
    pid.map_or_else(|| String::from("unknown pid"), |pid| pid.to_string())
}
