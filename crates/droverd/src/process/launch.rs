//! Runs one hosted daemon from argument parsing to exit.

use std::ffi::OsString;

use clap::Parser;
use drover_config::{Config, ensure_control_directory};
use drover_registry::FileRegistry;
use ortho_config::OrthoConfig;
use tracing::info;

use crate::cli::HostArgs;
use crate::daemons::find_daemon;
use crate::telemetry::{self, TelemetrySettings};

use super::PROCESS_TARGET;
use super::daemonizer::{Daemonizer, SystemDaemonizer};
use super::errors::HostError;
use super::guard::{Registration, RegistrationGuard};
use super::shutdown::{SignalStopSource, StopFlag, StopSource};

/// Loads configuration for the host.
pub trait ConfigLoader {
    /// Returns the layered configuration.
    fn load(&self) -> Result<Config, HostError>;
}

/// Loads defaults, the configuration file and `DROVER_*` environment.
///
/// Command-line flags belong to `droverd` itself, so none are layered.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, HostError> {
        Ok(Config::load_from_iter([OsString::from("droverd")])?)
    }
}

/// Returns a configuration fixed at construction time.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, HostError> {
        Ok(self.config.clone())
    }
}

/// Collaborators the host needs beyond its arguments.
pub struct HostDeps<'a> {
    pub loader: &'a dyn ConfigLoader,
    pub daemonizer: &'a dyn Daemonizer,
    pub stop_source: &'a dyn StopSource,
}

/// Parses `argv` and runs the requested daemon with production collaborators.
pub fn run_host<I, T>(argv: I) -> Result<(), HostError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    let args = HostArgs::try_parse_from(&argv)?;
    let recorded = argv
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    run_host_with(
        &args,
        recorded,
        &HostDeps {
            loader: &SystemConfigLoader,
            daemonizer: &SystemDaemonizer,
            stop_source: &SignalStopSource,
        },
    )
}

/// Runs the daemon named in `args` until a stop is requested.
///
/// Everything that can fail fast does so before the process detaches, so
/// `drover` still sees the error on the inherited stderr.
pub fn run_host_with(
    args: &HostArgs,
    argv: Vec<String>,
    deps: &HostDeps<'_>,
) -> Result<(), HostError> {
    let body = find_daemon(&args.daemon).ok_or_else(|| HostError::UnknownDaemon {
        daemon: args.daemon.clone(),
    })?;
    let config = deps.loader.load()?;
    let pid_directory = ensure_control_directory(&args.pid)?;
    let registry = FileRegistry::open(config.registry_directory().as_std_path())?;

    if args.daemonize {
        deps.daemonizer.daemonize(body.name())?;
    }
    let _telemetry = telemetry::initialise(&TelemetrySettings::resolve(&config, args))?;

    let stop = StopFlag::default();
    deps.stop_source.install(&stop)?;

    let guard = RegistrationGuard::acquire(
        &pid_directory,
        &registry,
        Registration {
            daemon: body.name(),
            pid: std::process::id(),
            argv,
            explicit_argv: args.arguments.clone(),
        },
    )?;
    body.run(&args.arguments, &stop);
    info!(
        target: PROCESS_TARGET,
        daemon = body.name(),
        id = %guard.id(),
        "daemon body returned"
    );
    drop(guard);
    Ok(())
}
