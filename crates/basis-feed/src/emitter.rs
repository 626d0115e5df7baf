//! Basis observation emission.
//!
//! Turns a completed pairing into an `Observation`, appends it to the
//! historical series and hands the series to the render and persist
//! collaborators. Collaborator failures are logged and counted but never
//! propagate: the caller always resets the pairing afterwards.

use crate::error::{FeedError, FeedResult};
use crate::pairing::CompletedPairing;
use basis_core::{
    floor_to_minute, Observation, ObservationSeries, Price, SeriesPersister, SeriesRenderer,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Emitter configuration.
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Number of most recent observations shown by the renderer.
    pub window: usize,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self { window: 9 }
    }
}

/// Counters for emission outcomes.
#[derive(Debug, Default)]
pub struct EmitterStats {
    emitted: AtomicU64,
    dropped: AtomicU64,
    render_failures: AtomicU64,
    persist_failures: AtomicU64,
}

impl EmitterStats {
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn render_failures(&self) -> u64 {
        self.render_failures.load(Ordering::Relaxed)
    }

    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }
}

/// Owns the observation series and the output collaborators.
pub struct ObservationEmitter {
    config: EmitterConfig,
    series: Mutex<ObservationSeries>,
    renderer: Arc<dyn SeriesRenderer>,
    persister: Arc<dyn SeriesPersister>,
    stats: EmitterStats,
}

impl ObservationEmitter {
    pub fn new(
        config: EmitterConfig,
        renderer: Arc<dyn SeriesRenderer>,
        persister: Arc<dyn SeriesPersister>,
    ) -> Self {
        Self {
            config,
            series: Mutex::new(ObservationSeries::new()),
            renderer,
            persister,
            stats: EmitterStats::default(),
        }
    }

    /// Build, record and publish the observation for a completed pairing.
    ///
    /// Fails when the prices do not yield a basis or the timestamp is out of
    /// range. Nothing is appended or published then.
    pub fn emit(&self, legs: &CompletedPairing) -> FeedResult<Observation> {
        let observation = match Self::build(legs) {
            Ok(observation) => observation,
            Err(e) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        let mut series = self.series.lock();
        let index = series.push(observation.clone());
        self.stats.emitted.fetch_add(1, Ordering::Relaxed);

        info!(
            index,
            exchange = %observation.exchange,
            time = %observation.time_label(),
            spot = %observation.spot,
            future = %observation.future,
            basis = %observation.basis,
            "Basis observation"
        );

        if let Err(e) = self.renderer.render(&series, self.config.window) {
            self.stats.render_failures.fetch_add(1, Ordering::Relaxed);
            warn!(?e, "Render failed");
        }
        if let Err(e) = self.persister.persist(&series) {
            self.stats.persist_failures.fetch_add(1, Ordering::Relaxed);
            warn!(?e, "Persist failed");
        }

        Ok(observation)
    }

    fn build(legs: &CompletedPairing) -> FeedResult<Observation> {
        let parse = |raw: &str, leg: &str| {
            Price::parse(raw).map_err(|_| FeedError::InvalidPrice {
                exchange: legs.exchange.to_string(),
                leg: leg.to_string(),
                raw: raw.to_string(),
            })
        };

        let spot = parse(&legs.spot_price, "spot")?;
        let future = parse(&legs.future_price, "future")?;
        let observed_at = floor_to_minute(legs.latest_timestamp())?;

        Observation::new(legs.exchange, spot, future, observed_at).map_err(|_| {
            FeedError::InvalidPrice {
                exchange: legs.exchange.to_string(),
                leg: "basis".to_string(),
                raw: format!("{} - {}", legs.future_price, legs.spot_price),
            }
        })
    }

    pub fn stats(&self) -> &EmitterStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.series.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.lock().is_empty()
    }

    /// Copy of the full series.
    pub fn series(&self) -> ObservationSeries {
        self.series.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis_core::{Exchange, SinkError};
    use mockall::mock;
    use rust_decimal_macros::dec;

    mock! {
        Renderer {}
        impl SeriesRenderer for Renderer {
            fn render(&self, series: &ObservationSeries, window: usize) -> Result<(), SinkError>;
        }
    }

    mock! {
        Persister {}
        impl SeriesPersister for Persister {
            fn persist(&self, series: &ObservationSeries) -> Result<(), SinkError>;
        }
    }

    fn legs(spot: &str, spot_ts: i64, future: &str, future_ts: i64) -> CompletedPairing {
        CompletedPairing {
            exchange: Exchange::Binance,
            spot_price: spot.to_string(),
            spot_timestamp: spot_ts,
            future_price: future.to_string(),
            future_timestamp: future_ts,
        }
    }

    fn quiet_renderer() -> MockRenderer {
        let mut renderer = MockRenderer::new();
        renderer.expect_render().returning(|_, _| Ok(()));
        renderer
    }

    fn quiet_persister() -> MockPersister {
        let mut persister = MockPersister::new();
        persister.expect_persist().returning(|_| Ok(()));
        persister
    }

    #[test]
    fn test_emit_rounds_and_computes_basis() {
        let emitter = ObservationEmitter::new(
            EmitterConfig::default(),
            Arc::new(quiet_renderer()),
            Arc::new(quiet_persister()),
        );

        let obs = emitter
            .emit(&legs("100.004", 1_700_000_000_000, "100.251", 1_700_000_000_000))
            .unwrap();

        assert_eq!(obs.spot.inner(), dec!(100.00));
        assert_eq!(obs.future.inner(), dec!(100.25));
        assert_eq!(obs.basis.inner(), dec!(0.25));
    }

    #[test]
    fn test_observed_at_uses_later_leg() {
        let emitter = ObservationEmitter::new(
            EmitterConfig::default(),
            Arc::new(quiet_renderer()),
            Arc::new(quiet_persister()),
        );

        // spot 22:13:21, future 22:14:19 UTC
        let obs = emitter
            .emit(&legs("1", 1_700_000_059_000, "2", 1_700_000_001_000))
            .unwrap();
        assert_eq!(obs.time_label(), "2023-11-14 22:14");
    }

    #[test]
    fn test_render_and_persist_receive_full_series() {
        let mut renderer = MockRenderer::new();
        renderer
            .expect_render()
            .withf(|series, window| !series.is_empty() && *window == 4)
            .times(2)
            .returning(|_, _| Ok(()));

        let mut persister = MockPersister::new();
        persister
            .expect_persist()
            .times(2)
            .returning(|_| Ok(()));

        let emitter = ObservationEmitter::new(
            EmitterConfig { window: 4 },
            Arc::new(renderer),
            Arc::new(persister),
        );

        emitter.emit(&legs("1", 1, "2", 2)).unwrap();
        emitter.emit(&legs("3", 3, "4", 4)).unwrap();
        assert_eq!(emitter.len(), 2);
    }

    #[test]
    fn test_sink_failures_do_not_fail_emit() {
        let mut renderer = MockRenderer::new();
        renderer
            .expect_render()
            .returning(|_, _| Err(SinkError::Render("terminal gone".to_string())));
        let mut persister = MockPersister::new();
        persister
            .expect_persist()
            .returning(|_| Err(SinkError::Persist("disk full".to_string())));

        let emitter =
            ObservationEmitter::new(EmitterConfig::default(), Arc::new(renderer), Arc::new(persister));

        assert!(emitter.emit(&legs("1", 1, "2", 2)).is_ok());
        assert_eq!(emitter.len(), 1);
        assert_eq!(emitter.stats().render_failures(), 1);
        assert_eq!(emitter.stats().persist_failures(), 1);
    }

    #[test]
    fn test_non_numeric_price_drops_observation() {
        let mut renderer = MockRenderer::new();
        renderer.expect_render().never();
        let mut persister = MockPersister::new();
        persister.expect_persist().never();

        let emitter =
            ObservationEmitter::new(EmitterConfig::default(), Arc::new(renderer), Arc::new(persister));

        let err = emitter.emit(&legs("42000.5", 1, "oops", 2)).unwrap_err();
        assert!(matches!(err, FeedError::InvalidPrice { ref leg, .. } if leg == "future"));
        assert!(emitter.is_empty());
        assert_eq!(emitter.stats().dropped(), 1);
        assert_eq!(emitter.stats().emitted(), 0);
    }

    #[test]
    fn test_basis_overflow_drops_observation() {
        let mut renderer = MockRenderer::new();
        renderer.expect_render().never();
        let mut persister = MockPersister::new();
        persister.expect_persist().never();

        let emitter =
            ObservationEmitter::new(EmitterConfig::default(), Arc::new(renderer), Arc::new(persister));

        let err = emitter
            .emit(&legs(
                "-79228162514264337593543950335",
                1,
                "79228162514264337593543950335",
                2,
            ))
            .unwrap_err();
        assert!(matches!(err, FeedError::InvalidPrice { ref leg, .. } if leg == "basis"));
        assert!(emitter.is_empty());
        assert_eq!(emitter.stats().dropped(), 1);
    }
}
