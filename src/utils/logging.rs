//! Diagnostic logging through `tracing`
//!
//! Progress output for humans goes to stdout through [`super::styling`];
//! everything here goes to stderr so it never mixes with that output.
//!
//! Verbosity maps to a level filter:
//!
//! - 0 (no `-v`): warn
//! - 1 (`-v`): info
//! - 2 (`-vv`): debug
//! - 3+ : trace
//!
//! `RUST_LOG`, when set, overrides the flag.

use std::io;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Multi-line, human-readable
    #[default]
    Pretty,
    /// Single-line
    Compact,
    /// One JSON object per event
    Json,
}

/// Level filter for a `-v` count
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber.
///
/// Returns an error if a subscriber is already installed.
pub fn init_logging(
    verbosity: u8,
    format: LogFormat,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = build_env_filter(level_for_verbosity(verbosity));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stderr).with_target(false))
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .try_init(),
    }
}

fn build_env_filter(level: Level) -> EnvFilter {
    // Dependencies stay at warn regardless of -v
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,loanprep={}",
            level.as_str().to_lowercase()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), Level::WARN);
        assert_eq!(level_for_verbosity(1), Level::INFO);
        assert_eq!(level_for_verbosity(2), Level::DEBUG);
        assert_eq!(level_for_verbosity(7), Level::TRACE);
    }
}
