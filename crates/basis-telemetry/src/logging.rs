//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Keeps stdout free for the console table.
    Stderr,
}

/// Initialize structured logging.
///
/// Configures tracing with JSON output for production (`RUST_ENV=production`)
/// and pretty output for development. `RUST_LOG` overrides the default
/// filter.
pub fn init_logging(target: LogTarget) -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,basis=debug"));

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match (is_production, target) {
        (true, LogTarget::Stdout) => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
        (true, LogTarget::Stderr) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        (false, LogTarget::Stdout) => registry
            .with(fmt::layer().pretty().with_target(true))
            .try_init(),
        (false, LogTarget::Stderr) => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
