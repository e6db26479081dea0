//! Structured telemetry initialisation for hosted daemons.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use drover_config::{Config, LogFormat, effective_log_filter};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime, writer::BoxMakeWriter};

use crate::cli::HostArgs;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the effective log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// The log file could not be opened for appending.
    #[error("failed to open log file '{}': {source}", .path.display())]
    LogFile {
        /// Log file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Resolved logging settings for one daemon process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySettings {
    pub filter: String,
    pub format: LogFormat,
    /// Append to this file; `None` writes to stderr.
    pub log_file: Option<PathBuf>,
}

impl TelemetrySettings {
    /// Combines configured logging with the flags `drover` passed.
    ///
    /// A `--trace` or `--verbose` from either source raises the filter.
    #[must_use]
    pub fn resolve(config: &Config, args: &HostArgs) -> Self {
        Self {
            filter: effective_log_filter(
                config.log_filter(),
                args.trace || config.trace(),
                args.verbose || config.verbose(),
            ),
            format: config.log_format(),
            log_file: args.log.clone(),
        }
    }
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Later calls return a fresh [`TelemetryHandle`] without touching the
/// installed subscriber.
pub fn initialise(settings: &TelemetrySettings) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(settings))
        .map(|_| TelemetryHandle)
}

fn open_log_file(path: &Path) -> Result<File, TelemetryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TelemetryError::LogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn install_subscriber(settings: &TelemetrySettings) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&settings.filter)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let (writer, ansi) = match &settings.log_file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(io::stderr), io::stderr().is_terminal()),
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match settings.format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> HostArgs {
        let mut argv = vec!["droverd", "TriggerDaemon", "--pid=/tmp"];
        argv.extend_from_slice(extra);
        HostArgs::try_parse_from(argv).expect("parse host args")
    }

    #[rstest]
    #[case::configured(&[], "info")]
    #[case::verbose(&["--verbose"], "debug")]
    #[case::trace(&["--trace"], "trace")]
    #[case::trace_wins(&["--trace", "--verbose"], "trace")]
    fn host_flags_raise_the_filter(#[case] extra: &[&str], #[case] expected: &str) {
        let settings = TelemetrySettings::resolve(&Config::default(), &args(extra));
        assert_eq!(settings.filter, expected);
        assert_eq!(settings.log_file, None);
    }

    #[test]
    fn log_flag_selects_the_file_sink() {
        let settings = TelemetrySettings::resolve(
            &Config::default(),
            &args(&["--log=/var/log/drover/daemons.log"]),
        );
        assert_eq!(
            settings.log_file,
            Some(PathBuf::from("/var/log/drover/daemons.log"))
        );
    }

    #[test]
    fn log_file_is_created_for_appending() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("daemons.log");
        std::fs::write(&path, "earlier\n").expect("seed log");
        drop(open_log_file(&path).expect("open"));
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "earlier\n");
    }

    #[test]
    fn unreachable_log_file_is_reported() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("missing").join("daemons.log");
        let error = open_log_file(&path).expect_err("parent is missing");
        assert!(matches!(error, TelemetryError::LogFile { .. }));
    }
}
