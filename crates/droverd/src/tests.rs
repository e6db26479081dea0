//! Host lifecycle tests driven through injected collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use drover_config::Config;
use drover_registry::{DaemonStatus, FileRegistry, pid_record_path};
use mockall::mock;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::{
    DaemonizeError, Daemonizer, HostArgs, HostDeps, HostError, ShutdownError, StaticConfigLoader,
    StopFlag, StopSource, run_host_with,
};

mock! {
    pub HostDaemonizer {}
    impl Daemonizer for HostDaemonizer {
        fn daemonize(&self, daemon: &str) -> Result<(), DaemonizeError>;
    }
}

/// Requests a stop before the body starts.
struct PreRaised;

impl StopSource for PreRaised {
    fn install(&self, flag: &StopFlag) -> Result<(), ShutdownError> {
        flag.raise();
        Ok(())
    }
}

/// Requests a stop once a running entry shows up in the registry.
struct RaiseWhenRegistered {
    registry_root: PathBuf,
    saw_running: Arc<AtomicBool>,
}

impl StopSource for RaiseWhenRegistered {
    fn install(&self, flag: &StopFlag) -> Result<(), ShutdownError> {
        let flag = flag.clone();
        let root = self.registry_root.clone();
        let saw_running = Arc::clone(&self.saw_running);
        thread::spawn(move || {
            let registry = FileRegistry::open(&root).expect("open registry");
            for _ in 0..500 {
                let running = registry.all().is_ok_and(|records| {
                    records
                        .iter()
                        .any(|record| record.status == DaemonStatus::Running)
                });
                if running {
                    saw_running.store(true, Ordering::SeqCst);
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
            flag.raise();
        });
        Ok(())
    }
}

struct HostFixture {
    dir: TempDir,
    config: Config,
}

impl HostFixture {
    fn registry_root(&self) -> PathBuf {
        self.dir.path().join("registry")
    }

    fn pid_directory(&self) -> PathBuf {
        self.dir.path().join("pid")
    }

    fn args(&self, daemon: &str, extra: &[&str]) -> (HostArgs, Vec<String>) {
        let mut argv = vec![
            String::from("droverd"),
            String::from(daemon),
            format!("--pid={}", self.pid_directory().display()),
        ];
        argv.extend(extra.iter().map(|arg| (*arg).to_owned()));
        let args = HostArgs::try_parse_from(&argv).expect("parse host args");
        (args, argv)
    }

    fn run(
        &self,
        args: &HostArgs,
        argv: Vec<String>,
        daemonizer: &MockHostDaemonizer,
        stop_source: &dyn StopSource,
    ) -> Result<(), HostError> {
        let loader = StaticConfigLoader::new(self.config.clone());
        run_host_with(
            args,
            argv,
            &HostDeps {
                loader: &loader,
                daemonizer,
                stop_source,
            },
        )
    }
}

fn utf8(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("utf-8 temp path")
}

#[fixture]
fn host() -> HostFixture {
    let dir = TempDir::new().expect("temp dir");
    let mut config = Config::default();
    config.pid_directory = utf8(&dir.path().join("pid"));
    config.log_directory = utf8(&dir.path().join("log"));
    config.registry_directory = utf8(&dir.path().join("registry"));
    HostFixture { dir, config }
}

fn never_daemonize() -> MockHostDaemonizer {
    let mut daemonizer = MockHostDaemonizer::new();
    daemonizer.expect_daemonize().never();
    daemonizer
}

#[rstest]
fn foreground_run_registers_then_retracts(host: HostFixture) {
    let (args, argv) = host.args("TriggerDaemon", &["--once"]);
    let saw_running = Arc::new(AtomicBool::new(false));
    let stop_source = RaiseWhenRegistered {
        registry_root: host.registry_root(),
        saw_running: Arc::clone(&saw_running),
    };

    host.run(&args, argv.clone(), &never_daemonize(), &stop_source)
        .expect("host run");

    assert!(saw_running.load(Ordering::SeqCst));
    let records = FileRegistry::open(&host.registry_root())
        .and_then(|registry| registry.all())
        .expect("registry entries");
    let [record] = records.as_slice() else {
        panic!("expected exactly one registry entry, found {records:?}");
    };
    assert_eq!(record.daemon, "TriggerDaemon");
    assert_eq!(record.pid, std::process::id());
    assert_eq!(record.status, DaemonStatus::Exited);
    assert_eq!(record.argv, argv);
    assert_eq!(record.explicit_argv, [String::from("--once")]);
    assert!(!pid_record_path(&host.pid_directory(), std::process::id()).exists());
}

#[rstest]
fn daemonize_flag_detaches_once(host: HostFixture) {
    let (args, argv) = host.args("TaskmasterDaemon", &["--daemonize"]);
    let mut daemonizer = MockHostDaemonizer::new();
    daemonizer
        .expect_daemonize()
        .withf(|daemon| daemon == "TaskmasterDaemon")
        .times(1)
        .returning(|_| Ok(()));

    host.run(&args, argv, &daemonizer, &PreRaised)
        .expect("host run");
}

#[rstest]
fn missing_pid_directory_is_created(host: HostFixture) {
    let (args, argv) = host.args("GarbageCollectorDaemon", &[]);
    assert!(!host.pid_directory().exists());

    host.run(&args, argv, &never_daemonize(), &PreRaised)
        .expect("host run");

    assert!(host.pid_directory().is_dir());
}

#[rstest]
#[case::unknown("NoSuchDaemon")]
#[case::abbreviation("Taskmaster")]
fn unknown_daemon_fails_before_side_effects(host: HostFixture, #[case] daemon: &str) {
    let (args, argv) = host.args(daemon, &["--daemonize"]);

    let error = host
        .run(&args, argv, &never_daemonize(), &PreRaised)
        .expect_err("unknown daemon");

    assert!(matches!(error, HostError::UnknownDaemon { daemon: ref name } if name == daemon));
    assert!(!host.pid_directory().exists());
    assert!(!host.registry_root().exists());
}
