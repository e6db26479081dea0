//! Shared configuration for the drover supervisor and daemon host.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then an
//! optional TOML file (`--config-path`), then `DROVER_*` environment
//! variables, then command-line flags. Both binaries load the same [`Config`]
//! so they agree on where PID records, logs and the registry live.

mod control;
mod defaults;
mod logging;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use control::{ControlDirectories, ControlDirectoryError, ensure_control_directory};
pub use defaults::{
    DAEMON_LOG_FILE, DEFAULT_LOG_FILTER, DEFAULT_TASKMASTERS, default_log_directory,
    default_log_filter, default_log_format, default_pid_directory, default_registry_directory,
};
pub use logging::{LogFormat, LogFormatParseError, effective_log_filter};

/// Environment variable naming the registry directory for spawned daemons.
pub const REGISTRY_DIRECTORY_ENV: &str = "DROVER_REGISTRY_DIRECTORY";

/// Resolved configuration for drover.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "DROVER")]
pub struct Config {
    /// Directory holding one PID record per locally running daemon.
    #[ortho_config(default = defaults::default_pid_directory())]
    pub pid_directory: Utf8PathBuf,
    /// Directory holding the consolidated daemon log.
    #[ortho_config(default = defaults::default_log_directory())]
    pub log_directory: Utf8PathBuf,
    /// Directory backing the shared daemon registry and lease table.
    #[ortho_config(default = defaults::default_registry_directory())]
    pub registry_directory: Utf8PathBuf,
    /// Launches every daemon with `--trace`.
    #[ortho_config(default = false)]
    pub trace: bool,
    /// Launches every daemon with `--verbose`.
    #[ortho_config(default = false)]
    pub verbose: bool,
    /// Number of taskmaster daemons launched by `drover start`.
    #[ortho_config(default = defaults::DEFAULT_TASKMASTERS)]
    pub taskmasters: u32,
    /// Overrides the daemon host binary (defaults to `droverd`).
    pub daemon_binary: Option<String>,
    /// Log filter expression applied by the daemon host.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format used by the daemon host.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pid_directory: default_pid_directory(),
            log_directory: default_log_directory(),
            registry_directory: default_registry_directory(),
            trace: false,
            verbose: false,
            taskmasters: DEFAULT_TASKMASTERS,
            daemon_binary: None,
            log_filter: defaults::default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Directory holding PID records.
    #[must_use]
    pub fn pid_directory(&self) -> &Utf8Path {
        self.pid_directory.as_path()
    }

    /// Directory holding the consolidated daemon log.
    #[must_use]
    pub fn log_directory(&self) -> &Utf8Path {
        self.log_directory.as_path()
    }

    /// Directory backing the daemon registry.
    #[must_use]
    pub fn registry_directory(&self) -> &Utf8Path {
        self.registry_directory.as_path()
    }

    /// Whether daemons are launched with tracing enabled.
    #[must_use]
    pub const fn trace(&self) -> bool {
        self.trace
    }

    /// Whether daemons are launched with verbose output.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Number of taskmaster daemons started by `drover start`.
    #[must_use]
    pub const fn taskmasters(&self) -> u32 {
        self.taskmasters
    }

    /// Explicit daemon host binary, if configured.
    #[must_use]
    pub fn daemon_binary(&self) -> Option<&str> {
        self.daemon_binary.as_deref()
    }

    /// Log filter expression for the daemon host.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format for the daemon host.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
