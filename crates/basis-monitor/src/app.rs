//! Main application orchestration.
//!
//! Wires the configured subscriptions, parsers, pairing book, emitter and
//! output sinks into a `FeedSupervisor`, then runs it until Ctrl-C.

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::render::ConsoleRenderer;
use crate::supervisor::{FeedSupervisor, StopReason};
use basis_feed::{EmitterConfig, ObservationEmitter, ParserTable};
use basis_persistence::CsvSeriesWriter;
use basis_ws::{Transport, WsTransport};
use std::sync::Arc;
use tracing::{error, info};

/// Main application.
pub struct Application {
    config: AppConfig,
    supervisor: FeedSupervisor,
}

impl Application {
    /// Create an application using the live WebSocket transport.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        Self::with_transport(config, Arc::new(WsTransport::new()))
    }

    /// Create an application over any transport.
    pub fn with_transport(config: AppConfig, transport: Arc<dyn Transport>) -> AppResult<Self> {
        config.validate()?;

        let symbol = config.tracked_symbol()?;
        let subscriptions = config.effective_subscriptions()?;
        for spec in &subscriptions {
            info!(exchange = %spec.exchange, endpoint = %spec.endpoint, "Subscription");
        }

        let renderer = Arc::new(ConsoleRenderer::new(&config.render));
        let persister = Arc::new(CsvSeriesWriter::new(&config.persistence.path));
        let emitter = ObservationEmitter::new(
            EmitterConfig {
                window: config.render.window,
            },
            renderer,
            persister,
        );

        let supervisor = FeedSupervisor::new(
            transport,
            subscriptions,
            ParserTable::new(&symbol),
            emitter,
            config.restart_interval(),
        );

        Ok(Self { config, supervisor })
    }

    pub fn supervisor(&self) -> &FeedSupervisor {
        &self.supervisor
    }

    /// Run feed cycles until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        info!(
            symbol = %self.config.symbol,
            restart_interval_secs = self.config.restart_interval_secs,
            log = %self.config.persistence.path.display(),
            "Starting basis monitor"
        );

        let shutdown = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => {
                    error!(?e, "Failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            }
        };

        let reason = self.supervisor.run_until(shutdown, None).await;

        let stats = self.supervisor.emitter().stats();
        info!(
            ?reason,
            observations = stats.emitted(),
            dropped = stats.dropped(),
            render_failures = stats.render_failures(),
            persist_failures = stats.persist_failures(),
            "Shutting down"
        );
        Ok(())
    }
}
