use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Chooses the effective log filter for a daemon host.
///
/// `trace` wins over `verbose`; without either flag the configured filter is
/// used unchanged.
#[must_use]
pub fn effective_log_filter(configured: &str, trace: bool, verbose: bool) -> String {
    if trace {
        String::from("trace")
    } else if verbose {
        String::from("debug")
    } else {
        configured.to_owned()
    }
}
