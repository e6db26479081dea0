//! Unit tests for argument routing and individual controller commands.

use std::cell::RefCell;
use std::ffi::OsString;
use std::process::ExitCode;

use drover_config::Config;
use rstest::rstest;

use super::support::{Behaviour, StaticConfigLoader, TestLifecycle, TestWorld, decode_utf8, world};
use crate::lifecycle::{LifecycleCommand, LifecycleError};
use crate::{IoStreams, run_with_handler};

struct Routed {
    exit: ExitCode,
    stdout: String,
    stderr: String,
    calls: Vec<LifecycleCommand>,
}

fn route(args: &[&str]) -> Routed {
    let lifecycle = TestLifecycle::default();
    let loader = StaticConfigLoader::new(Config::default());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let argv = std::iter::once("drover")
        .chain(args.iter().copied())
        .map(OsString::from);
    let exit = {
        let mut io = IoStreams::new(&mut stdout, &mut stderr);
        run_with_handler(argv, &mut io, &loader, |command, context, output| {
            lifecycle.handle(command, context, output)
        })
    };
    Routed {
        exit,
        stdout: decode_utf8(stdout, "stdout").expect("stdout"),
        stderr: decode_utf8(stderr, "stderr").expect("stderr"),
        calls: lifecycle.calls(),
    }
}

#[rstest]
#[case(&["list"], LifecycleCommand::List)]
#[case(&["status"], LifecycleCommand::Status)]
#[case(&["start"], LifecycleCommand::Start { keep_leases: false })]
#[case(&["restart", "--keep-leases"], LifecycleCommand::Restart { keep_leases: true })]
#[case(
    &["stop", "12", "abc", "-3"],
    LifecycleCommand::Stop {
        pids: vec![String::from("12"), String::from("abc"), String::from("-3")],
    }
)]
#[case(
    &["--pid-directory", "/srv/pid", "launch", "task", "--once", "-v"],
    LifecycleCommand::Launch {
        daemon: String::from("task"),
        arguments: vec![String::from("--once"), String::from("-v")],
    }
)]
#[case(
    &["debug", "Trigger"],
    LifecycleCommand::Debug { daemon: String::from("Trigger"), arguments: Vec::new() }
)]
fn subcommands_reach_the_lifecycle_handler(
    #[case] args: &[&str],
    #[case] expected: LifecycleCommand,
) {
    let routed = route(args);
    assert_eq!(routed.exit, ExitCode::SUCCESS);
    assert_eq!(routed.calls, [expected.clone()]);
    assert_eq!(routed.stdout, format!("handled {}\n", expected.name()));
}

#[test]
fn help_goes_to_stdout() {
    let routed = route(&["--help"]);
    assert_eq!(routed.exit, ExitCode::SUCCESS);
    assert!(routed.stdout.contains("Usage"));
    assert!(routed.calls.is_empty());
}

#[test]
fn bare_invocation_fails_with_usage() {
    let routed = route(&[]);
    assert_eq!(routed.exit, ExitCode::FAILURE);
    assert!(routed.stderr.contains("Usage"));
    assert!(routed.calls.is_empty());
}

#[test]
fn unknown_subcommand_is_rejected() {
    let routed = route(&["frobnicate"]);
    assert_eq!(routed.exit, ExitCode::FAILURE);
    assert!(routed.stderr.contains("frobnicate"));
    assert!(routed.calls.is_empty());
}

#[test]
fn lifecycle_errors_are_printed_to_stderr() {
    let loader = StaticConfigLoader::new(Config::default());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = {
        let mut io = IoStreams::new(&mut stdout, &mut stderr);
        run_with_handler(
            [OsString::from("drover"), OsString::from("start")],
            &mut io,
            &loader,
            |_, _, _| Err(LifecycleError::DaemonsAlreadyRunning),
        )
    };
    let stderr = decode_utf8(stderr, "stderr").expect("stderr");
    assert_eq!(exit, ExitCode::FAILURE);
    assert!(stderr.starts_with("drover start: Unable to start daemons"));
    assert!(stderr.contains("'drover restart'"));
    assert!(stdout.is_empty());
}

#[rstest]
fn list_prints_the_catalog(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.run("list");
    world.assert_success().expect("success");
    assert_eq!(
        world.stdout_text().expect("stdout"),
        "Available daemons:\n    GarbageCollectorDaemon\n    RepositoryPullLocalDaemon\n    \
         TaskmasterDaemon\n    TriggerDaemon\n"
    );
}

#[rstest]
fn status_reports_local_and_remote_daemons(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world
        .add_local_daemon("TaskmasterDaemon", 4021, Behaviour::Cooperative)
        .expect("local daemon");
    world
        .add_remote_daemon("TriggerDaemon", "web-02", 77)
        .expect("remote daemon");
    world.run("status");

    world.assert_success().expect("success");
    let stdout = world.stdout_text().expect("stdout");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "{stdout}");
    assert!(lines[0].starts_with("PID"));
    assert!(lines[1].starts_with("4021"));
    assert!(lines[1].contains("TaskmasterDaemon"));
    assert!(lines[1].contains("running"));
    assert!(lines[2].contains("web-02"));
    assert!(lines[2].contains("TriggerDaemon"));
}

#[rstest]
fn status_flags_dead_local_daemons(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world
        .add_stale_daemon("GarbageCollectorDaemon", 913)
        .expect("stale daemon");
    world.run("status");

    world.assert_failure().expect("failure");
    let stdout = world.stdout_text().expect("stdout");
    assert!(stdout.contains("913"));
    assert!(stdout.contains("dead"));
    assert!(world.stderr_text().expect("stderr").contains("drover stop"));
}

#[rstest]
fn status_with_nothing_known_says_so(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.run("status");
    world.assert_success().expect("success");
    assert_eq!(
        world.stderr_text().expect("stderr"),
        "There are no running daemons.\n"
    );
}

#[rstest]
#[case(Some(0), true)]
#[case(None, true)]
#[case(Some(3), false)]
fn debug_maps_the_daemon_exit_status(
    world: RefCell<TestWorld>,
    #[case] exit: Option<i32>,
    #[case] succeeds: bool,
) {
    let mut world = world.borrow_mut();
    world.spawner.set_debug_exit(exit);
    world.run("debug trigger --once");

    if succeeds {
        world.assert_success().expect("success");
    } else {
        world.assert_failure().expect("failure");
        assert!(
            world
                .stderr_text()
                .expect("stderr")
                .contains("Daemon exited with status 3.")
        );
    }
    let attached = world.spawner.attached();
    let plan = attached.first().expect("attached launch");
    assert_eq!(plan.daemon, "TriggerDaemon");
    assert_eq!(plan.arguments.last().map(String::as_str), Some("--once"));
    let stdout = world.stdout_text().expect("stdout");
    assert!(stdout.contains("\n    $ droverd TriggerDaemon --trace --verbose "));
}

#[rstest]
fn launch_starts_one_background_daemon(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.run("launch pull");

    world.assert_success().expect("success");
    assert_eq!(
        world.spawner.launched_daemons(),
        [String::from("RepositoryPullLocalDaemon")]
    );
    let stderr = world.stderr_text().expect("stderr");
    assert!(stderr.starts_with("Preparing to launch daemons.\nNOTE: Logs will appear in '"));
    assert!(
        world
            .stdout_text()
            .expect("stdout")
            .contains("Launching daemon \"RepositoryPullLocalDaemon\".")
    );
}

#[rstest]
fn restart_stops_then_starts(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.config.taskmasters = 1;
    world
        .add_local_daemon("TaskmasterDaemon", 4100, Behaviour::Cooperative)
        .expect("local daemon");
    world.run("restart --keep-leases");

    world.assert_success().expect("success");
    assert!(!world.pid_record_exists(4100));
    assert_eq!(world.spawner.launched_daemons().len(), 3);
    let stderr = world.stderr_text().expect("stderr");
    let stopping = stderr.find("Stopping daemon").expect("stop output");
    let leases = stderr
        .find("Not touching active task queue leases.")
        .expect("start output");
    assert!(stopping < leases);
}
