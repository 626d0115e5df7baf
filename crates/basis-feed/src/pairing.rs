//! Per-exchange leg pairing.
//!
//! An `ExchangePairing` accumulates the latest spot and future leg of one
//! exchange until both are present. The `PairingBook` owns one pairing per
//! tracked exchange and is the only place where updates, the completeness
//! check, emission and the reset happen, all under that exchange's lock.

use crate::emitter::ObservationEmitter;
use basis_core::{Exchange, Leg, LegUpdate, Observation};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Latest spot and future values for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangePairing {
    exchange: Exchange,
    spot_price: Option<String>,
    spot_timestamp: Option<i64>,
    future_price: Option<String>,
    future_timestamp: Option<i64>,
}

/// Both legs of a complete pairing.
///
/// Only obtainable from `ExchangePairing::completed`, so an emitter handed
/// one never sees a half-filled pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPairing {
    pub exchange: Exchange,
    pub spot_price: String,
    pub spot_timestamp: i64,
    pub future_price: String,
    pub future_timestamp: i64,
}

impl CompletedPairing {
    /// The later of the two leg timestamps.
    pub fn latest_timestamp(&self) -> i64 {
        self.spot_timestamp.max(self.future_timestamp)
    }
}

impl ExchangePairing {
    /// Rest state: no leg set.
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange,
            spot_price: None,
            spot_timestamp: None,
            future_price: None,
            future_timestamp: None,
        }
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    /// Overwrite the update's leg. Latest wins; timestamps are not compared,
    /// so an older update arriving late replaces a newer one.
    pub fn apply_update(&mut self, update: LegUpdate) {
        match update.leg {
            Leg::Spot => {
                self.spot_price = Some(update.price);
                self.spot_timestamp = Some(update.timestamp_ms);
            }
            Leg::Future => {
                self.future_price = Some(update.price);
                self.future_timestamp = Some(update.timestamp_ms);
            }
        }
    }

    /// True iff both prices and both timestamps are set.
    pub fn is_complete(&self) -> bool {
        self.spot_price.is_some()
            && self.spot_timestamp.is_some()
            && self.future_price.is_some()
            && self.future_timestamp.is_some()
    }

    /// Snapshot of both legs when complete.
    pub fn completed(&self) -> Option<CompletedPairing> {
        match (
            &self.spot_price,
            self.spot_timestamp,
            &self.future_price,
            self.future_timestamp,
        ) {
            (Some(spot_price), Some(spot_timestamp), Some(future_price), Some(future_timestamp)) => {
                Some(CompletedPairing {
                    exchange: self.exchange,
                    spot_price: spot_price.clone(),
                    spot_timestamp,
                    future_price: future_price.clone(),
                    future_timestamp,
                })
            }
            _ => None,
        }
    }

    /// Back to rest state.
    pub fn reset(&mut self) {
        self.spot_price = None;
        self.spot_timestamp = None;
        self.future_price = None;
        self.future_timestamp = None;
    }

    pub fn spot(&self) -> Option<(&str, i64)> {
        Some((self.spot_price.as_deref()?, self.spot_timestamp?))
    }

    pub fn future(&self) -> Option<(&str, i64)> {
        Some((self.future_price.as_deref()?, self.future_timestamp?))
    }
}

/// One pairing per tracked exchange, created at startup.
pub struct PairingBook {
    pairings: HashMap<Exchange, Mutex<ExchangePairing>>,
}

impl PairingBook {
    pub fn new(exchanges: impl IntoIterator<Item = Exchange>) -> Self {
        Self {
            pairings: exchanges
                .into_iter()
                .map(|e| (e, Mutex::new(ExchangePairing::new(e))))
                .collect(),
        }
    }

    /// Book covering every known exchange.
    pub fn all() -> Self {
        Self::new(Exchange::ALL)
    }

    /// Apply one leg update and, if that completes the pairing, emit an
    /// observation and reset.
    ///
    /// Completeness is re-checked after every single-leg update. The pairing
    /// is reset after any emission attempt, including a failed one.
    pub fn apply(
        &self,
        exchange: Exchange,
        update: LegUpdate,
        emitter: &ObservationEmitter,
    ) -> Option<Observation> {
        let Some(slot) = self.pairings.get(&exchange) else {
            warn!(%exchange, "Update for untracked exchange dropped");
            return None;
        };

        let mut pairing = slot.lock();
        debug!(%exchange, leg = %update.leg, price = %update.price, ts = update.timestamp_ms, "Leg update");
        pairing.apply_update(update);

        let legs = pairing.completed()?;
        let emitted = match emitter.emit(&legs) {
            Ok(observation) => Some(observation),
            Err(e) => {
                warn!(%exchange, ?e, "Observation dropped");
                None
            }
        };
        pairing.reset();
        emitted
    }

    /// Copy of an exchange's current pairing.
    pub fn snapshot(&self, exchange: Exchange) -> Option<ExchangePairing> {
        self.pairings.get(&exchange).map(|p| p.lock().clone())
    }
}
