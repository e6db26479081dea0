//! Command-line contract between `drover` and the daemon host.

use std::path::PathBuf;

use clap::Parser;

/// Arguments `drover` passes when it launches a daemon.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "droverd",
    about = "Hosts a single drover daemon until it is told to stop."
)]
pub struct HostArgs {
    /// Catalog identifier of the daemon to run.
    #[arg(value_name = "DAEMON")]
    pub daemon: String,
    /// Logs at trace level.
    #[arg(long)]
    pub trace: bool,
    /// Logs at debug level.
    #[arg(long)]
    pub verbose: bool,
    /// Detaches from the terminal before running.
    #[arg(long)]
    pub daemonize: bool,
    /// Appends log output to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
    /// Directory receiving this daemon's PID record.
    #[arg(long, value_name = "DIR")]
    pub pid: PathBuf,
    /// Arguments addressed to the daemon itself.
    #[arg(
        value_name = "ARG",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub arguments: Vec<String>,
}
