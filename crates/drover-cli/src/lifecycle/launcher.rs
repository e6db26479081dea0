//! Daemon launching.
//!
//! Builds the `droverd` command line for a resolved daemon and starts it,
//! either detached in the background or attached to the terminal for
//! debugging.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use drover_config::{Config, DAEMON_LOG_FILE, REGISTRY_DIRECTORY_ENV, ensure_control_directory};
use drover_registry::DAEMON_CLASSES;

use super::error::LifecycleError;
use super::interrupt::InterruptGuard;
use super::resolver::resolve_daemon;
use super::types::LifecycleOutput;

/// Environment variable overriding the daemon host binary.
pub const DAEMON_BINARY_ENV: &str = "DROVERD_BIN";
const DEFAULT_DAEMON_BINARY: &str = "droverd";

/// How a daemon is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Daemonized, logging to the shared log file.
    Production,
    /// Attached to the terminal with tracing enabled.
    Debug,
}

/// Fully resolved daemon host invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub daemon: String,
    pub program: OsString,
    pub arguments: Vec<String>,
    pub environment: Vec<(String, String)>,
}

impl LaunchPlan {
    /// Shell-quoted rendering of the command for the operator.
    #[must_use]
    pub fn command_line(&self) -> String {
        let program = self.program.to_string_lossy();
        std::iter::once(program.as_ref())
            .chain(self.arguments.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote(argument: &str) -> String {
    shlex::try_quote(argument).map_or_else(|_| format!("{argument:?}"), |quoted| quoted.into_owned())
}

fn quote_all(arguments: &[String]) -> String {
    arguments
        .iter()
        .map(|argument| quote(argument))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Starts daemon host processes.
pub trait Spawner {
    /// Starts the process in the background without waiting for it.
    fn spawn_detached(&self, plan: &LaunchPlan) -> Result<(), LifecycleError>;

    /// Runs the process attached to the terminal until it exits.
    ///
    /// Returns the exit code, or `None` when a signal ended the process.
    fn run_attached(&self, plan: &LaunchPlan) -> Result<Option<i32>, LifecycleError>;
}

/// Spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl SystemSpawner {
    fn command(plan: &LaunchPlan) -> Command {
        let mut command = Command::new(&plan.program);
        command.args(&plan.arguments);
        for (key, value) in &plan.environment {
            command.env(key, value);
        }
        command
    }
}

impl Spawner for SystemSpawner {
    fn spawn_detached(&self, plan: &LaunchPlan) -> Result<(), LifecycleError> {
        Self::command(plan)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|source| LifecycleError::LaunchDaemon {
                binary: plan.program.clone(),
                source,
            })
    }

    fn run_attached(&self, plan: &LaunchPlan) -> Result<Option<i32>, LifecycleError> {
        let mut child =
            Self::command(plan)
                .spawn()
                .map_err(|source| LifecycleError::LaunchDaemon {
                    binary: plan.program.clone(),
                    source,
                })?;
        let status = child
            .wait()
            .map_err(|source| LifecycleError::MonitorChild {
                binary: plan.program.clone(),
                source,
            })?;
        Ok(status.code())
    }
}

/// Resolves, plans and starts daemons.
pub struct DaemonLauncher<'a> {
    config: &'a Config,
    spawner: &'a dyn Spawner,
}

impl<'a> DaemonLauncher<'a> {
    #[must_use]
    pub fn new(config: &'a Config, spawner: &'a dyn Spawner) -> Self {
        Self { config, spawner }
    }

    /// Launches the daemon matching `fragment` with `arguments`.
    ///
    /// Returns the exit code of a debug session; production launches return
    /// `Some(0)` once the process is spawned.
    pub fn launch<W: Write, E: Write>(
        &self,
        fragment: &str,
        arguments: &[String],
        mode: LaunchMode,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<Option<i32>, LifecycleError> {
        let daemon = resolve_daemon(DAEMON_CLASSES, fragment)?;
        write_launch_notice(output, &daemon, arguments, mode)?;
        let plan = self.plan(daemon, arguments, mode)?;

        match mode {
            LaunchMode::Production => {
                self.spawner.spawn_detached(&plan)?;
                Ok(Some(0))
            }
            LaunchMode::Debug => {
                output.stdout_line(format_args!("\n    $ {}\n", plan.command_line()))?;
                let _guard = InterruptGuard::ignore()?;
                self.spawner.run_attached(&plan)
            }
        }
    }

    /// Builds the host invocation without starting anything.
    pub fn plan(
        &self,
        daemon: String,
        arguments: &[String],
        mode: LaunchMode,
    ) -> Result<LaunchPlan, LifecycleError> {
        let debug = mode == LaunchMode::Debug;
        let mut host_arguments = vec![daemon.clone()];
        if debug || self.config.trace() {
            host_arguments.push(String::from("--trace"));
        }
        if debug || self.config.verbose() {
            host_arguments.push(String::from("--verbose"));
        }
        if !debug {
            host_arguments.push(String::from("--daemonize"));
            let log_directory = ensure_control_directory(self.config.log_directory().as_std_path())?;
            let log_file = log_directory.join(DAEMON_LOG_FILE);
            host_arguments.push(format!("--log={}", log_file.display()));
        }

        let pid_directory = ensure_control_directory(self.config.pid_directory().as_std_path())?;
        check_pid_directory(&pid_directory)?;
        host_arguments.push(format!("--pid={}", pid_directory.display()));
        host_arguments.extend(arguments.iter().cloned());

        Ok(LaunchPlan {
            daemon,
            program: self.daemon_binary(),
            arguments: host_arguments,
            environment: vec![(
                String::from(REGISTRY_DIRECTORY_ENV),
                self.config.registry_directory().to_string(),
            )],
        })
    }

    fn daemon_binary(&self) -> OsString {
        self.config
            .daemon_binary()
            .map(OsString::from)
            .or_else(|| env::var_os(DAEMON_BINARY_ENV))
            .unwrap_or_else(|| OsString::from(DEFAULT_DAEMON_BINARY))
    }
}

fn write_launch_notice<W: Write, E: Write>(
    output: &mut LifecycleOutput<W, E>,
    daemon: &str,
    arguments: &[String],
    mode: LaunchMode,
) -> Result<(), LifecycleError> {
    let debug_note = match mode {
        LaunchMode::Debug => " in debug mode (not daemonized)",
        LaunchMode::Production => "",
    };
    if arguments.is_empty() {
        output.stdout_line(format_args!("Launching daemon \"{daemon}\"{debug_note}."))
    } else {
        output.stdout_line(format_args!(
            "Launching daemon \"{daemon}\"{debug_note} with arguments {}.",
            quote_all(arguments)
        ))
    }
}

fn check_pid_directory(path: &Path) -> Result<(), LifecycleError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(LifecycleError::PidDirectoryMissing {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(LifecycleError::PidDirectoryInspect {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if !metadata.is_dir() {
        return Err(LifecycleError::PidDirectoryNotDirectory {
            path: path.to_path_buf(),
        });
    }
    if !is_writable(path, &metadata) {
        return Err(LifecycleError::PidDirectoryNotWritable {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn is_writable(path: &Path, _metadata: &fs::Metadata) -> bool {
    use nix::unistd::{AccessFlags, access};
    access(path, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable(_path: &Path, metadata: &fs::Metadata) -> bool {
    !metadata.permissions().readonly()
}
