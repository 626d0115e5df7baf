//! Prometheus metrics and structured logging for the basis monitor.
//!
//! - Prometheus counters and gauges for feed traffic, observations,
//!   connection failures and sink failures
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogTarget};
pub use metrics::Metrics;
