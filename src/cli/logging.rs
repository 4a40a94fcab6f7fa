//! Log output setup

use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter, e.g. `DOTRUN_LOG=dotrun::runner=debug`
pub const LOG_ENV: &str = "DOTRUN_LOG";

/// Verbosity level for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// No output
    Silent,
    /// Only task output and errors
    Quiet,
    /// Normal output
    Normal,
    /// Verbose output
    Verbose,
}

impl Verbosity {
    /// Log filter used when [`LOG_ENV`] is not set
    pub fn default_filter(self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// How log lines are written to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Timestamp, level, target and fields
    Text,
    /// One JSON object per line
    Json,
    /// The message and fields only
    Message,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "message" => Ok(LogFormat::Message),
            other => Err(format!(
                "unknown output format '{}', expected one of: text, json, message",
                other
            )),
        }
    }
}

/// Install the global subscriber. Does nothing if one is already installed.
pub fn init_logging(verbosity: Verbosity, format: LogFormat) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_filter()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Message => builder
            .without_time()
            .with_level(false)
            .with_target(false)
            .try_init(),
    };
}
