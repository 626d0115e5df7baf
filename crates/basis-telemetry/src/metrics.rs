//! Prometheus metrics for the basis monitor.
//!
//! Everything lives in the default process registry; there is no HTTP
//! exporter. `Metrics::encode` renders the text exposition format for logs.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure means duplicate metric
//! names, which can only happen at static initialization.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_int_counter, CounterVec, Encoder,
    GaugeVec, IntCounter, TextEncoder,
};

/// Raw messages received.
pub static MESSAGES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "basis_messages_total",
        "Raw messages received per exchange",
        &["exchange"]
    )
    .unwrap()
});

/// Leg updates extracted from relevant messages.
pub static LEG_UPDATES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "basis_leg_updates_total",
        "Leg updates extracted per exchange and leg",
        &["exchange", "leg"]
    )
    .unwrap()
});

/// Observations emitted.
pub static OBSERVATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "basis_observations_total",
        "Basis observations emitted per exchange",
        &["exchange"]
    )
    .unwrap()
});

/// Most recent rounded basis.
pub static LAST_BASIS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "basis_last_basis",
        "Most recent basis (future - spot) per exchange",
        &["exchange"]
    )
    .unwrap()
});

/// Connections that ended in an error.
/// Labels: reason (connect/send/closed/listen)
pub static CONNECTION_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "basis_connection_failures_total",
        "Connections ended by an error",
        &["exchange", "reason"]
    )
    .unwrap()
});

/// Supervisor cycles completed.
pub static CYCLES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("basis_cycles_total", "Supervisor cycles completed").unwrap()
});

/// Render or persist failures.
/// Labels: sink (render/persist)
pub static SINK_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "basis_sink_failures_total",
        "Render and persist failures",
        &["sink"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record one raw message.
    pub fn message_received(exchange: &str) {
        MESSAGES_TOTAL.with_label_values(&[exchange]).inc();
    }

    /// Record one extracted leg update.
    pub fn leg_update(exchange: &str, leg: &str) {
        LEG_UPDATES_TOTAL.with_label_values(&[exchange, leg]).inc();
    }

    /// Record an emitted observation and its basis.
    pub fn observation(exchange: &str, basis: f64) {
        OBSERVATIONS_TOTAL.with_label_values(&[exchange]).inc();
        LAST_BASIS.with_label_values(&[exchange]).set(basis);
    }

    /// Record a connection ended by an error.
    pub fn connection_failure(exchange: &str, reason: &str) {
        CONNECTION_FAILURES_TOTAL
            .with_label_values(&[exchange, reason])
            .inc();
    }

    /// Record a completed cycle.
    pub fn cycle_completed() {
        CYCLES_TOTAL.inc();
    }

    /// Record `count` new failures of a sink.
    pub fn sink_failures(sink: &str, count: u64) {
        if count > 0 {
            SINK_FAILURES_TOTAL
                .with_label_values(&[sink])
                .inc_by(count as f64);
        }
    }

    /// Text exposition of every registered metric.
    pub fn encode() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
