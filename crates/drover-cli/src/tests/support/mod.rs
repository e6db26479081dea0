//! Test support utilities for drover CLI behavioural coverage.
//!
//! Supplies a harness that drives the real lifecycle controller against
//! temporary control directories and scripted processes, so step definitions
//! and unit tests remain focused on their assertions.

mod fakes;

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result, ensure};
use camino::Utf8PathBuf;
use drover_config::Config;
use drover_registry::{
    DaemonId, DaemonRecord, DaemonRegistry, DaemonStatus, FileLeaseTable, FileRegistry, LeaseRow,
    PidRecordContents, pid_record_path, write_pid_record,
};
use rstest::fixture;
use tempfile::TempDir;

use crate::lifecycle::{
    Collaborators, LifecycleCommand, LifecycleContext, LifecycleController, LifecycleError,
    LifecycleOutput,
};
use crate::{AppError, ConfigLoader, IoStreams, run_with_handler};

pub(crate) use fakes::{
    Behaviour, FAKE_EPOCH_SECONDS, FakeClock, FakeProcesses, RecordingSpawner,
};

/// Host name recorded for daemons the harness registers as local.
pub(crate) const LOCAL_HOST: &str = "drover-test-host";

/// A config loader that returns a fixed configuration for tests.
pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Captures lifecycle invocations for runner tests.
#[derive(Default)]
pub(super) struct TestLifecycle {
    calls: RefCell<Vec<LifecycleCommand>>,
}

impl TestLifecycle {
    pub fn calls(&self) -> Vec<LifecycleCommand> {
        self.calls.borrow().clone()
    }

    pub fn handle<W: Write, E: Write>(
        &self,
        command: LifecycleCommand,
        _context: LifecycleContext<'_>,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        output.stdout_line(format_args!("handled {command}"))?;
        self.calls.borrow_mut().push(command);
        Ok(ExitCode::SUCCESS)
    }
}

/// Test world holding temporary control directories, scripted collaborators
/// and captured output.
pub(super) struct TestWorld {
    _dir: TempDir,
    pub config: Config,
    pub registry: FileRegistry,
    pub leases: FileLeaseTable,
    pub clock: FakeClock,
    pub processes: FakeProcesses,
    pub spawner: RecordingSpawner,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
    next_registration: u64,
}

impl TestWorld {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow::anyhow!("temp dir is not UTF-8: {}", path.display()))?;
        let config = Config {
            pid_directory: root.join("pid"),
            log_directory: root.join("log"),
            registry_directory: root.join("registry"),
            daemon_binary: Some(String::from("droverd")),
            ..Config::default()
        };
        fs::create_dir_all(config.pid_directory.as_std_path()).context("create pid dir")?;
        let registry = FileRegistry::open(config.registry_directory.as_std_path())?;
        let leases = FileLeaseTable::open(config.registry_directory.as_std_path())?;
        Ok(Self {
            _dir: dir,
            config,
            registry,
            leases,
            clock: FakeClock::default(),
            processes: FakeProcesses::default(),
            spawner: RecordingSpawner::default(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
            next_registration: 1,
        })
    }

    /// Registers a daemon on this host with a PID record and a live process.
    pub fn add_local_daemon(&mut self, daemon: &str, pid: u32, behaviour: Behaviour) -> Result<()> {
        self.record_local_daemon(daemon, pid)?;
        self.processes.spawn(pid, behaviour);
        Ok(())
    }

    /// Registers a daemon on this host whose process has already gone.
    pub fn add_stale_daemon(&mut self, daemon: &str, pid: u32) -> Result<()> {
        self.record_local_daemon(daemon, pid)
    }

    /// Registers a running daemon owned by another host.
    pub fn add_remote_daemon(&mut self, daemon: &str, host: &str, pid: u32) -> Result<()> {
        let record = self.next_record(daemon, host, pid);
        self.registry.register(&record)?;
        Ok(())
    }

    fn record_local_daemon(&mut self, daemon: &str, pid: u32) -> Result<()> {
        let record = self.next_record(daemon, LOCAL_HOST, pid);
        self.registry.register(&record)?;
        write_pid_record(
            self.config.pid_directory.as_std_path(),
            &PidRecordContents {
                pid,
                host: LOCAL_HOST.to_owned(),
                daemon: daemon.to_owned(),
                daemon_id: record.id,
            },
        )?;
        Ok(())
    }

    fn next_record(&mut self, daemon: &str, host: &str, pid: u32) -> DaemonRecord {
        let registered_at = self.next_registration;
        self.next_registration += 1;
        DaemonRecord {
            id: DaemonId::new(host, pid, registered_at),
            daemon: daemon.to_owned(),
            host: host.to_owned(),
            pid,
            argv: vec![String::from("droverd"), daemon.to_owned()],
            explicit_argv: Vec::new(),
            status: DaemonStatus::Running,
            registered_at,
        }
    }

    /// Seeds the lease table with one row per expiry.
    ///
    /// Positive offsets expire after the fake clock's current time.
    pub fn seed_leases(&self, offsets: &[Option<i64>]) -> Result<()> {
        let rows: Vec<LeaseRow> = offsets
            .iter()
            .zip(1_u64..)
            .map(|(offset, task_id)| LeaseRow {
                task_id,
                owner: offset.map(|_| format!("worker-{task_id}")),
                lease_expires: offset.map(|delta| FAKE_EPOCH_SECONDS.saturating_add_signed(delta)),
            })
            .collect();
        self.leases.replace(&rows)?;
        Ok(())
    }

    pub fn lease_expiries(&self) -> Result<Vec<Option<u64>>> {
        Ok(self
            .leases
            .rows()?
            .into_iter()
            .map(|row| row.lease_expires)
            .collect())
    }

    pub fn pid_record_exists(&self, pid: u32) -> bool {
        pid_record_path(self.config.pid_directory.as_std_path(), pid).exists()
    }

    pub fn registry_status(&self, pid: u32) -> Result<DaemonStatus> {
        let record = self
            .registry
            .all()?
            .into_iter()
            .find(|record| record.pid == pid)
            .with_context(|| format!("no registry entry for pid {pid}"))?;
        Ok(record.status)
    }

    /// Runs `command` through the CLI runtime against the scripted collaborators.
    pub fn run(&mut self, command: &str) {
        self.stdout.clear();
        self.stderr.clear();
        let args = Self::build_args(command);
        let loader = StaticConfigLoader::new(self.config.clone());
        let deps = || Collaborators {
            registry: &self.registry,
            leases: &self.leases,
            processes: &self.processes,
            clock: &self.clock,
            spawner: &self.spawner,
        };
        let mut io = IoStreams::new(&mut self.stdout, &mut self.stderr);
        let exit = run_with_handler(args, &mut io, &loader, |command, context, output| {
            LifecycleController::new(context, deps()).handle(command, output)
        });
        self.exit_code = Some(exit);
    }

    fn build_args(command: &str) -> Vec<OsString> {
        let mut args = vec![OsString::from("drover")];
        args.extend(
            command
                .split_whitespace()
                .map(|token| OsString::from(token.trim_matches('"'))),
        );
        args
    }

    pub fn stdout_text(&self) -> Result<String> {
        decode_utf8(self.stdout.clone(), "stdout")
    }

    pub fn stderr_text(&self) -> Result<String> {
        decode_utf8(self.stderr.clone(), "stderr")
    }

    pub fn assert_success(&self) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(
            exit == ExitCode::SUCCESS,
            "expected success, got {exit:?}; stderr: {}",
            self.stderr_text()?
        );
        Ok(())
    }

    pub fn assert_failure(&self) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(
            exit == ExitCode::FAILURE,
            "expected failure exit code, got {exit:?}"
        );
        Ok(())
    }
}

pub(super) fn decode_utf8(buffer: Vec<u8>, label: &str) -> Result<String> {
    String::from_utf8(buffer).with_context(|| format!("{label} utf8"))
}

// ── Fixtures ───────────────────────────────────────────────────────────────────

#[fixture]
pub(super) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new().expect("test world"))
}
