//! Precision-safe decimal prices.
//!
//! Uses `rust_decimal` for exact decimal arithmetic so that the
//! two-decimal rounding of spot, future and basis values does not
//! depend on binary floating-point representation.

use crate::error::{CoreError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits kept on every emitted value.
pub const DISPLAY_DP: u32 = 2;

/// Price with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    /// Parse a raw exchange price field.
    ///
    /// Exchanges send prices as decimal strings ("42000.5"); scientific
    /// notation is accepted as a fallback.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Self)
            .map_err(|_| CoreError::InvalidPrice(raw.to_string()))
    }

    /// `self - rhs`, or `None` when the result is outside the decimal range.
    #[inline]
    pub fn checked_sub(&self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Round to two decimals (banker's rounding on exact midpoints) and fix
    /// the scale so the value always displays with two fractional digits.
    #[inline]
    pub fn round_2dp(&self) -> Self {
        let mut rounded = self
            .0
            .round_dp_with_strategy(DISPLAY_DP, RoundingStrategy::MidpointNearestEven);
        rounded.rescale(DISPLAY_DP);
        Self(rounded)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}
