use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::runtime_dir;

/// Default number of taskmaster daemons launched by `drover start`.
pub const DEFAULT_TASKMASTERS: u32 = 4;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// File name of the consolidated daemon log inside the log directory.
pub const DAEMON_LOG_FILE: &str = "daemons.log";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon host.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Directory holding one PID record per locally running daemon.
pub fn default_pid_directory() -> Utf8PathBuf {
    control_base().join("pid")
}

/// Directory holding the shared daemon log.
pub fn default_log_directory() -> Utf8PathBuf {
    control_base().join("log")
}

/// Directory backing the daemon registry and lease table.
pub fn default_registry_directory() -> Utf8PathBuf {
    control_base().join("registry")
}

#[cfg(unix)]
fn control_base() -> Utf8PathBuf {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("drover");
    if apply_namespace {
        base.push(user_namespace());
    }
    base
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn control_base() -> Utf8PathBuf {
    fallback_base_directory().join("drover")
}
