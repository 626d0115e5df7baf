//! Tick and observation types.
//!
//! Contains the closed set of tracked exchanges, the leg vocabulary
//! produced by the tick parsers, and the finalized `Observation` record.

use crate::error::{CoreError, Result};
use crate::Price;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display format of `Observation::observed_at` (minute granularity).
pub const OBSERVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Tracked exchange.
///
/// A fixed, enumerated set: each variant has its own message shapes and
/// therefore its own tick parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Exchange {
    Binance,
    Bybit,
    Okx,
}

impl Exchange {
    /// All tracked exchanges, in display order.
    pub const ALL: [Exchange; 3] = [Exchange::Binance, Exchange::Bybit, Exchange::Okx];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "Binance",
            Self::Bybit => "Bybit",
            Self::Okx => "Okx",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownExchange(s.to_string()))
    }
}

/// One side of a basis pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    Spot,
    Future,
}

impl Leg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Future => "future",
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized single-leg tick extracted from a raw exchange message.
///
/// The price is kept exactly as the exchange sent it; numeric conversion
/// happens only when an observation is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegUpdate {
    pub leg: Leg,
    /// Raw price field.
    pub price: String,
    /// Exchange event time, epoch milliseconds.
    pub timestamp_ms: i64,
}

impl LegUpdate {
    pub fn new(leg: Leg, price: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            leg,
            price: price.into(),
            timestamp_ms,
        }
    }

    pub fn spot(price: impl Into<String>, timestamp_ms: i64) -> Self {
        Self::new(Leg::Spot, price, timestamp_ms)
    }

    pub fn future(price: impl Into<String>, timestamp_ms: i64) -> Self {
        Self::new(Leg::Future, price, timestamp_ms)
    }
}

/// Convert an epoch-millisecond timestamp to UTC, truncated to the minute.
pub fn floor_to_minute(timestamp_ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .and_then(|t| t.duration_trunc(TimeDelta::minutes(1)).ok())
        .ok_or(CoreError::InvalidTimestamp(timestamp_ms))
}

/// One finalized basis data point.
///
/// Spot, future and basis are each rounded to two decimals independently;
/// basis is computed from the unrounded prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Later of the two leg timestamps, truncated to the minute.
    pub observed_at: DateTime<Utc>,
    pub exchange: Exchange,
    pub spot: Price,
    pub future: Price,
    pub basis: Price,
}

impl Observation {
    /// Build an observation from unrounded leg prices.
    ///
    /// Fails when `future - spot` does not fit in a decimal.
    pub fn new(
        exchange: Exchange,
        spot: Price,
        future: Price,
        observed_at: DateTime<Utc>,
    ) -> Result<Self> {
        let basis = future
            .checked_sub(spot)
            .ok_or_else(|| CoreError::BasisOverflow {
                spot: spot.to_string(),
                future: future.to_string(),
            })?;

        Ok(Self {
            observed_at,
            exchange,
            spot: spot.round_2dp(),
            future: future.round_2dp(),
            basis: basis.round_2dp(),
        })
    }

    /// `observed_at` formatted as `YYYY-MM-DD HH:MM`.
    pub fn time_label(&self) -> String {
        self.observed_at.format(OBSERVED_AT_FORMAT).to_string()
    }
}
