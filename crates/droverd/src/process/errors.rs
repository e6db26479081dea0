//! Defines the unified error surface for the daemon host.

use std::sync::Arc;

use drover_config::ControlDirectoryError;
use drover_registry::RegistryError;
use ortho_config::OrthoError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

use super::daemonizer::DaemonizeError;
use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising a hosted daemon.
#[derive(Debug, Error)]
pub enum HostError {
    /// Command-line arguments were rejected.
    #[error("{0}")]
    Usage(#[from] clap::Error),
    /// The requested daemon is not in the catalog.
    #[error("unknown daemon '{daemon}'; run 'drover list' for the available daemons")]
    UnknownDaemon {
        /// Identifier as passed on the command line.
        daemon: String,
    },
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The PID directory could not be prepared.
    #[error(transparent)]
    ControlDirectory(#[from] ControlDirectoryError),
    /// Registry or PID record access failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Daemonisation failed.
    #[error("failed to daemonise: {source}")]
    Daemonize {
        /// Underlying daemonisation error.
        #[source]
        source: DaemonizeError,
    },
    /// Installing the stop signal handlers failed.
    #[error("failed to install stop signal handlers: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
}

impl From<Arc<OrthoError>> for HostError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Config { source }
    }
}

impl From<DaemonizeError> for HostError {
    fn from(source: DaemonizeError) -> Self {
        Self::Daemonize { source }
    }
}

impl From<ShutdownError> for HostError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
