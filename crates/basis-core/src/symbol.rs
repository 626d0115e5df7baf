//! Tracked trading pair.

use crate::error::{CoreError, Result};
use std::fmt;

/// Quote assets recognised when splitting a concatenated symbol.
///
/// Longer suffixes first so `USDT` wins over `USD`.
const QUOTE_ASSETS: [&str; 4] = ["USDT", "USDC", "BUSD", "USD"];

/// The single pair the monitor tracks, e.g. `BTCUSDT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedSymbol {
    base: String,
    quote: String,
}

impl TrackedSymbol {
    /// Split a concatenated symbol into base and quote assets.
    pub fn new(symbol: &str) -> Result<Self> {
        let upper = symbol.trim().to_ascii_uppercase();
        if upper.is_empty() || !upper.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidSymbol(symbol.to_string()));
        }

        QUOTE_ASSETS
            .iter()
            .find_map(|quote| {
                upper
                    .strip_suffix(quote)
                    .filter(|base| !base.is_empty())
                    .map(|base| Self {
                        base: base.to_string(),
                        quote: (*quote).to_string(),
                    })
            })
            .ok_or_else(|| CoreError::InvalidSymbol(symbol.to_string()))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Concatenated form (`BTCUSDT`).
    pub fn concat(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Bybit spot ticker topic (`tickers.BTCUSDT`).
    pub fn bybit_spot_topic(&self) -> String {
        format!("tickers.{}", self.concat())
    }

    /// OKX spot instrument id (`BTC-USDT`).
    pub fn okx_spot_inst_id(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

impl fmt::Display for TrackedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.quote)
    }
}
