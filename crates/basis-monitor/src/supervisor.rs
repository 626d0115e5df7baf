//! Feed supervisor.
//!
//! Runs one listener per subscription, all concurrently, and waits for every
//! one of them to finish before the batch is considered done. Each listener
//! walks `Connecting -> Subscribed -> Listening -> Done` and stops after the
//! first message whose top-level shape is relevant to its exchange. Batches
//! repeat after a fixed sleep, which is the only recovery mechanism.

use basis_core::{Exchange, Observation, SubscriptionSpec};
use basis_feed::{FeedError, ObservationEmitter, PairingBook, ParserTable};
use basis_telemetry::Metrics;
use basis_ws::{Connection, Transport, WsError};
use futures_util::future::join_all;
use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Listener lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Subscribed,
    Listening,
    Done,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Listening => "listening",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Why a listener reached `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Saw a relevant message.
    Relevant,
    /// Could not connect; nothing was sent or received.
    ConnectFailed(String),
    /// Sending the subscribe payload failed.
    SubscribeFailed(String),
    /// Peer closed before a relevant message arrived.
    Closed,
    /// Transport error or undecodable message while listening.
    Failed(String),
}

impl ConnectionOutcome {
    /// Metric label for failed outcomes.
    fn failure_reason(&self) -> Option<&'static str> {
        match self {
            Self::Relevant => None,
            Self::ConnectFailed(_) => Some("connect"),
            Self::SubscribeFailed(_) => Some("send"),
            Self::Closed => Some("closed"),
            Self::Failed(_) => Some("listen"),
        }
    }
}

/// Result of one listener.
#[derive(Debug, Clone)]
pub struct ConnectionReport {
    pub exchange: Exchange,
    pub endpoint: String,
    pub outcome: ConnectionOutcome,
    /// Raw messages received.
    pub messages: usize,
    /// Observations emitted while this listener was applying updates.
    pub observations: Vec<Observation>,
}

/// Result of one batch.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub connections: Vec<ConnectionReport>,
    pub elapsed: Duration,
}

impl CycleReport {
    pub fn relevant(&self) -> usize {
        self.connections
            .iter()
            .filter(|c| c.outcome == ConnectionOutcome::Relevant)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.connections.len() - self.relevant()
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.connections.iter().flat_map(|c| c.observations.iter())
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Why the supervisor loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    /// Reached the requested number of cycles.
    CycleLimit,
}

/// Owns the feed pipeline for the process lifetime.
pub struct FeedSupervisor {
    transport: Arc<dyn Transport>,
    subscriptions: Vec<SubscriptionSpec>,
    parsers: ParserTable,
    book: PairingBook,
    emitter: ObservationEmitter,
    restart_interval: Duration,
    /// Emitter sink failure counts already exported as metrics.
    exported_sink_failures: Mutex<(u64, u64)>,
}

impl FeedSupervisor {
    pub fn new(
        transport: Arc<dyn Transport>,
        subscriptions: Vec<SubscriptionSpec>,
        parsers: ParserTable,
        emitter: ObservationEmitter,
        restart_interval: Duration,
    ) -> Self {
        Self {
            transport,
            subscriptions,
            parsers,
            book: PairingBook::all(),
            emitter,
            restart_interval,
            exported_sink_failures: Mutex::new((0, 0)),
        }
    }

    pub fn emitter(&self) -> &ObservationEmitter {
        &self.emitter
    }

    pub fn book(&self) -> &PairingBook {
        &self.book
    }

    /// Run batches until `shutdown` resolves or `max_cycles` batches finish.
    ///
    /// Shutdown is honored both while a batch is running and during the
    /// sleep between batches.
    pub async fn run_until<F>(&self, shutdown: F, max_cycles: Option<u64>) -> StopReason
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut cycles = 0u64;

        loop {
            tokio::select! {
                report = self.run_cycle() => {
                    cycles += 1;
                    info!(
                        cycle = cycles,
                        connections = report.connections.len(),
                        relevant = report.relevant(),
                        failed = report.failed(),
                        observations = report.observations().count(),
                        total_observations = self.emitter.len(),
                        elapsed_ms = elapsed_ms(report.elapsed),
                        "Cycle complete"
                    );
                }
                _ = &mut shutdown => {
                    info!(cycles, "Shutdown during cycle");
                    return StopReason::Shutdown;
                }
            }

            if max_cycles.is_some_and(|max| cycles >= max) {
                return StopReason::CycleLimit;
            }

            debug!(secs = self.restart_interval.as_secs(), "Sleeping before next cycle");
            tokio::select! {
                _ = tokio::time::sleep(self.restart_interval) => {}
                _ = &mut shutdown => {
                    info!(cycles, "Shutdown between cycles");
                    return StopReason::Shutdown;
                }
            }
        }
    }

    /// One batch: every subscription listened to concurrently, waiting for
    /// all of them. A slow listener is never cancelled.
    pub async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        info!(connections = self.subscriptions.len(), "Starting feed cycle");

        let connections = join_all(self.subscriptions.iter().map(|spec| self.listen(spec))).await;

        for report in &connections {
            if let Some(reason) = report.outcome.failure_reason() {
                Metrics::connection_failure(report.exchange.as_str(), reason);
            }
        }
        self.export_sink_failures();
        Metrics::cycle_completed();

        match Metrics::encode() {
            Ok(text) => debug!(metrics = %text, "Metrics snapshot"),
            Err(e) => warn!(?e, "Failed to encode metrics"),
        }

        CycleReport {
            connections,
            elapsed: started.elapsed(),
        }
    }

    /// Drive one subscription through its lifecycle.
    async fn listen(&self, spec: &SubscriptionSpec) -> ConnectionReport {
        let mut report = ConnectionReport {
            exchange: spec.exchange,
            endpoint: spec.endpoint.clone(),
            outcome: ConnectionOutcome::Relevant,
            messages: 0,
            observations: Vec::new(),
        };

        self.transition(spec, ConnectionState::Connecting);
        let mut conn = match self.transport.connect(&spec.endpoint).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(exchange = %spec.exchange, endpoint = %spec.endpoint, ?e, "Connection failed");
                report.outcome = ConnectionOutcome::ConnectFailed(e.to_string());
                self.transition(spec, ConnectionState::Done);
                return report;
            }
        };

        let outcome = self.subscribe_and_listen(spec, &mut conn, &mut report).await;
        report.outcome = outcome;

        self.transition(spec, ConnectionState::Done);
        if let Err(e) = conn.close().await {
            debug!(endpoint = %spec.endpoint, ?e, "Close failed");
        }
        report
    }

    async fn subscribe_and_listen(
        &self,
        spec: &SubscriptionSpec,
        conn: &mut Box<dyn Connection>,
        report: &mut ConnectionReport,
    ) -> ConnectionOutcome {
        if let Some(request) = spec.subscribe_text() {
            if let Err(e) = conn.send(&request).await {
                warn!(exchange = %spec.exchange, endpoint = %spec.endpoint, ?e, "Subscribe failed");
                return ConnectionOutcome::SubscribeFailed(e.to_string());
            }
        }
        self.transition(spec, ConnectionState::Subscribed);

        self.transition(spec, ConnectionState::Listening);
        loop {
            let raw = match conn.receive().await {
                Ok(raw) => raw,
                Err(e) => return Self::receive_failure(spec, e),
            };
            report.messages += 1;
            Metrics::message_received(spec.exchange.as_str());

            match self.handle_message(spec.exchange, &raw) {
                Ok((relevant, observation)) => {
                    report.observations.extend(observation);
                    if relevant {
                        return ConnectionOutcome::Relevant;
                    }
                }
                Err(e) => {
                    warn!(exchange = %spec.exchange, endpoint = %spec.endpoint, ?e, "Unreadable message");
                    return ConnectionOutcome::Failed(e.to_string());
                }
            }
        }
    }

    /// Parse one raw message and apply any leg update to the exchange's
    /// pairing. Returns whether the message was relevant and the observation
    /// it completed, if any.
    pub fn handle_message(
        &self,
        exchange: Exchange,
        raw: &str,
    ) -> Result<(bool, Option<Observation>), FeedError> {
        let outcome = self.parsers.parse_text(exchange, raw)?;

        let observation = outcome.update.and_then(|update| {
            Metrics::leg_update(exchange.as_str(), update.leg.as_str());
            self.book.apply(exchange, update, &self.emitter)
        });

        if let Some(obs) = &observation {
            Metrics::observation(exchange.as_str(), obs.basis.inner().to_f64().unwrap_or_default());
        }

        Ok((outcome.relevant, observation))
    }

    fn receive_failure(spec: &SubscriptionSpec, e: WsError) -> ConnectionOutcome {
        if e.is_closed() {
            info!(exchange = %spec.exchange, endpoint = %spec.endpoint, %e, "Connection closed");
            ConnectionOutcome::Closed
        } else {
            error!(exchange = %spec.exchange, endpoint = %spec.endpoint, kind = e.kind(), ?e, "Receive failed");
            ConnectionOutcome::Failed(e.to_string())
        }
    }

    fn transition(&self, spec: &SubscriptionSpec, state: ConnectionState) {
        debug!(exchange = %spec.exchange, endpoint = %spec.endpoint, %state, "Connection state");
    }

    fn export_sink_failures(&self) {
        let stats = self.emitter.stats();
        let (render, persist) = (stats.render_failures(), stats.persist_failures());

        let mut exported = self.exported_sink_failures.lock();
        Metrics::sink_failures("render", render - exported.0);
        Metrics::sink_failures("persist", persist - exported.1);
        *exported = (render, persist);
    }
}
