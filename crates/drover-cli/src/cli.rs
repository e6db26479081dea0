//! CLI argument definitions for drover.

use clap::{Parser, Subcommand};

/// Command-line interface for the drover daemon supervisor.
#[derive(Parser, Debug)]
#[command(
    name = "drover",
    about = "Start, inspect and stop drover background daemons.",
    disable_help_subcommand = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Lifecycle subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Lists the daemons this host can run.
    List,
    /// Shows local daemons and daemons registered by other hosts.
    Status,
    /// Starts the standard daemon set.
    Start {
        /// Leaves active task queue leases untouched.
        #[arg(long)]
        keep_leases: bool,
    },
    /// Stops every local daemon, or only the listed PIDs.
    Stop {
        #[arg(value_name = "PID", num_args = 0.., allow_hyphen_values = true)]
        pids: Vec<String>,
    },
    /// Stops every local daemon, then starts the standard daemon set.
    Restart {
        /// Leaves active task queue leases untouched.
        #[arg(long)]
        keep_leases: bool,
    },
    /// Launches a single daemon in the background.
    Launch {
        /// Daemon name or unambiguous fragment of one.
        #[arg(value_name = "DAEMON")]
        daemon: String,
        /// Arguments passed to the daemon.
        #[arg(
            value_name = "ARG",
            num_args = 0..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        arguments: Vec<String>,
    },
    /// Runs a single daemon in the foreground with tracing enabled.
    Debug {
        /// Daemon name or unambiguous fragment of one.
        #[arg(value_name = "DAEMON")]
        daemon: String,
        /// Arguments passed to the daemon.
        #[arg(
            value_name = "ARG",
            num_args = 0..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        arguments: Vec<String>,
    },
}
