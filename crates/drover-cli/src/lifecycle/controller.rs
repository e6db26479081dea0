//! High-level orchestration for daemon lifecycle commands.
//!
//! Wires discovery, launching, lease bookkeeping and the stop sequence into
//! the commands the CLI exposes.

use std::io::Write;
use std::process::ExitCode;

use drover_config::{Config, ControlDirectories};
use drover_registry::{
    DAEMON_CLASSES, DaemonRegistry, DaemonStatus, FileLeaseTable, FileRegistry,
    GARBAGE_COLLECTOR_DAEMON, LeaseStore, REPOSITORY_PULL_LOCAL_DAEMON, TASKMASTER_DAEMON,
};

use super::discovery::{DaemonDiscovery, DaemonReference};
use super::error::LifecycleError;
use super::launcher::{DaemonLauncher, LaunchMode, Spawner, SystemSpawner};
use super::processes::{Clock, ProcessControl, SystemClock, SystemProcesses};
use super::report::render_table;
use super::resolver::resolve_daemon;
use super::shutdown::{ShutdownDeps, select_targets, stop_daemons};
use super::types::{LifecycleCommand, LifecycleContext, LifecycleOutput};

/// External systems the controller talks to.
pub struct Collaborators<'a> {
    pub registry: &'a dyn DaemonRegistry,
    pub leases: &'a dyn LeaseStore,
    pub processes: &'a dyn ProcessControl,
    pub clock: &'a dyn Clock,
    pub spawner: &'a dyn Spawner,
}

/// Production lifecycle entrypoint backed by the filesystem and real processes.
#[derive(Debug, Default)]
pub struct SystemLifecycle;

impl SystemLifecycle {
    pub fn handle<W: Write, E: Write>(
        &self,
        command: LifecycleCommand,
        context: LifecycleContext<'_>,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        let registry_root = context.config.registry_directory().as_std_path();
        let registry = FileRegistry::open(registry_root)?;
        let leases = FileLeaseTable::open(registry_root)?;
        let deps = Collaborators {
            registry: &registry,
            leases: &leases,
            processes: &SystemProcesses,
            clock: &SystemClock,
            spawner: &SystemSpawner,
        };
        LifecycleController::new(context, deps).handle(command, output)
    }
}

/// Runs lifecycle commands against injected collaborators.
pub struct LifecycleController<'a> {
    config: &'a Config,
    deps: Collaborators<'a>,
}

impl<'a> LifecycleController<'a> {
    #[must_use]
    pub fn new(context: LifecycleContext<'a>, deps: Collaborators<'a>) -> Self {
        Self {
            config: context.config,
            deps,
        }
    }

    pub fn handle<W: Write, E: Write>(
        &self,
        command: LifecycleCommand,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        match command {
            LifecycleCommand::List => self.list(output),
            LifecycleCommand::Status => self.status(output),
            LifecycleCommand::Start { keep_leases } => self.start(keep_leases, output),
            LifecycleCommand::Stop { pids } => self.stop(&pids, output),
            LifecycleCommand::Restart { keep_leases } => {
                self.stop(&[], output)?;
                self.start(keep_leases, output)
            }
            LifecycleCommand::Launch { daemon, arguments } => {
                self.launch(&daemon, &arguments, output)
            }
            LifecycleCommand::Debug { daemon, arguments } => {
                self.debug(&daemon, &arguments, output)
            }
        }
    }

    fn discovery(&self) -> DaemonDiscovery<'_> {
        DaemonDiscovery::new(self.config.pid_directory().as_std_path(), self.deps.registry)
    }

    fn launcher(&self) -> DaemonLauncher<'_> {
        DaemonLauncher::new(self.config, self.deps.spawner)
    }

    fn list<W: Write, E: Write>(
        &self,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        output.stdout_line(format_args!("Available daemons:"))?;
        for daemon in DAEMON_CLASSES {
            output.stdout_line(format_args!("    {daemon}"))?;
        }
        Ok(ExitCode::SUCCESS)
    }

    fn status<W: Write, E: Write>(
        &self,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        let daemons = self.discovery().load_all_running_daemons()?;
        if daemons.is_empty() {
            output.stderr_line(format_args!("There are no running daemons."))?;
            return Ok(ExitCode::SUCCESS);
        }

        let mut stale = false;
        let mut rows = Vec::with_capacity(daemons.len());
        for daemon in &daemons {
            let status = self.observed_status(daemon)?;
            stale |= daemon.is_local() && status == DaemonStatus::Dead;
            rows.push([
                daemon
                    .pid()
                    .map_or_else(|| String::from("?"), |pid| pid.to_string()),
                daemon.host().unwrap_or("?").to_owned(),
                daemon.name().unwrap_or("unknown").to_owned(),
                status.to_string(),
                daemon
                    .record()
                    .map(|record| shell_words(&record.explicit_argv))
                    .unwrap_or_default(),
            ]);
        }
        for line in render_table(["PID", "Host", "Daemon", "Status", "Argv"], &rows) {
            output.stdout_line(format_args!("{line}"))?;
        }

        if stale {
            output.stderr_line(format_args!(
                "Some local daemons are not running; use 'drover stop' to clear their PID records."
            ))?;
            return Ok(ExitCode::FAILURE);
        }
        Ok(ExitCode::SUCCESS)
    }

    fn observed_status(&self, daemon: &DaemonReference) -> Result<DaemonStatus, LifecycleError> {
        if !daemon.is_local() {
            return Ok(daemon
                .record()
                .map_or(DaemonStatus::Unknown, |record| record.status));
        }
        if !daemon.is_running(self.deps.processes)? {
            return Ok(DaemonStatus::Dead);
        }
        Ok(daemon
            .record()
            .map_or(DaemonStatus::Running, |record| record.status))
    }

    fn start<W: Write, E: Write>(
        &self,
        keep_leases: bool,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        for daemon in self.discovery().load_running_daemons()? {
            if daemon.is_running(self.deps.processes)? {
                return Err(LifecycleError::DaemonsAlreadyRunning);
            }
        }

        if keep_leases {
            output.stderr_line(format_args!("Not touching active task queue leases."))?;
        } else {
            output.stderr_line(format_args!("Freeing active task leases..."))?;
            let now = self.deps.clock.unix_seconds()?;
            let freed = self.deps.leases.free_active_leases(now)?;
            output.stderr_line(format_args!("Freed {freed} task lease(s)."))?;
        }

        self.announce_launch(output)?;
        let taskmasters = usize::try_from(self.config.taskmasters()).unwrap_or(usize::MAX);
        let daemons = [REPOSITORY_PULL_LOCAL_DAEMON, GARBAGE_COLLECTOR_DAEMON]
            .into_iter()
            .chain(std::iter::repeat_n(TASKMASTER_DAEMON, taskmasters));
        let launcher = self.launcher();
        for daemon in daemons {
            launcher.launch(daemon, &[], LaunchMode::Production, output)?;
        }

        output.stderr_line(format_args!("Done."))?;
        Ok(ExitCode::SUCCESS)
    }

    fn stop<W: Write, E: Write>(
        &self,
        pids: &[String],
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        let daemons = self.discovery().load_running_daemons()?;
        if daemons.is_empty() {
            output.stderr_line(format_args!("There are no running daemons."))?;
            return Ok(ExitCode::SUCCESS);
        }

        let targets = select_targets(daemons, pids, output)?;
        if targets.is_empty() {
            output.stderr_line(format_args!("No daemons to kill."))?;
            return Ok(ExitCode::SUCCESS);
        }

        let deps = ShutdownDeps {
            registry: self.deps.registry,
            processes: self.deps.processes,
            clock: self.deps.clock,
        };
        stop_daemons(&targets, &deps, output)?;
        Ok(ExitCode::SUCCESS)
    }

    fn launch<W: Write, E: Write>(
        &self,
        daemon: &str,
        arguments: &[String],
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        let daemon = resolve_daemon(DAEMON_CLASSES, daemon)?;
        self.announce_launch(output)?;
        self.launcher()
            .launch(&daemon, arguments, LaunchMode::Production, output)?;
        Ok(ExitCode::SUCCESS)
    }

    fn debug<W: Write, E: Write>(
        &self,
        daemon: &str,
        arguments: &[String],
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        match self
            .launcher()
            .launch(daemon, arguments, LaunchMode::Debug, output)?
        {
            Some(0) | None => Ok(ExitCode::SUCCESS),
            Some(code) => {
                output.stderr_line(format_args!("Daemon exited with status {code}."))?;
                Ok(ExitCode::FAILURE)
            }
        }
    }

    fn announce_launch<W: Write, E: Write>(
        &self,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<(), LifecycleError> {
        let directories = ControlDirectories::prepare(self.config)?;
        output.stderr_line(format_args!("Preparing to launch daemons."))?;
        output.stderr_line(format_args!(
            "NOTE: Logs will appear in '{}'.\n",
            directories.log_file().display()
        ))
    }
}

fn shell_words(arguments: &[String]) -> String {
    arguments
        .iter()
        .map(|argument| {
            shlex::try_quote(argument).map_or_else(|_| argument.clone(), |quoted| quoted.into_owned())
        })
        .collect::<Vec<_>>()
        .join(" ")
}
