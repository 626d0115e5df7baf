//! Per-exchange tick parsing.
//!
//! Each exchange sends differently shaped messages for its spot and futures
//! channels. A `TickParser` recognizes the shapes of one exchange and pulls
//! out a single-leg `(price, timestamp)` update. Parsers are pure: they never
//! fail and never touch pairing state. Anything they do not recognize yields
//! `None`.
//!
//! Formats handled:
//! - Binance: `{"e":"aggTrade","p":..,"E":..}` (spot) and
//!   `{"e":"continuous_kline","k":{"c":..,"T":..}}` (future)
//! - Bybit: `{"topic":"tickers.<SYM>","ts":..,"data":{"lastPrice":..}}`,
//!   the spot topic is the spot leg, any other topic the future leg
//! - OKX: `{"arg":{"instId":..},"data":[{"last":..,"ts":..}]}`, the spot
//!   instrument id is the spot leg, any other instrument the future leg

use crate::error::FeedResult;
use basis_core::{Exchange, Leg, LegUpdate, TrackedSymbol};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Binance aggregated-trade event type (spot leg).
pub const BINANCE_AGG_TRADE: &str = "aggTrade";
/// Binance continuous-kline event type (future leg).
pub const BINANCE_CONTINUOUS_KLINE: &str = "continuous_kline";

/// Numeric field that may arrive as a JSON string or a JSON number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Number(serde_json::Number),
}

impl RawNumber {
    /// The field as the exchange sent it, for later decimal conversion.
    fn as_price(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }

    /// Epoch milliseconds, if the field is an integer or a digit string.
    fn as_millis(&self) -> Option<i64> {
        match self {
            Self::Text(s) => s.trim().parse().ok(),
            Self::Number(n) => n.as_i64(),
        }
    }
}

/// Binance spot aggregated trade.
#[derive(Debug, Deserialize)]
struct BinanceAggTrade {
    #[serde(rename = "p")]
    price: RawNumber,
    #[serde(rename = "E")]
    event_time: RawNumber,
}

/// Binance futures continuous kline wrapper.
#[derive(Debug, Deserialize)]
struct BinanceContinuousKline {
    #[serde(rename = "k")]
    kline: BinanceKline,
}

#[derive(Debug, Deserialize)]
struct BinanceKline {
    #[serde(rename = "c")]
    close: RawNumber,
    #[serde(rename = "T")]
    close_time: RawNumber,
}

/// Bybit v5 ticker push.
#[derive(Debug, Deserialize)]
struct BybitTicker {
    topic: String,
    ts: RawNumber,
    data: BybitTickerData,
}

#[derive(Debug, Deserialize)]
struct BybitTickerData {
    #[serde(rename = "lastPrice")]
    last_price: RawNumber,
}

/// OKX v5 ticker push.
#[derive(Debug, Deserialize)]
struct OkxTicker {
    arg: OkxArg,
    data: Vec<OkxTickerData>,
}

#[derive(Debug, Deserialize)]
struct OkxArg {
    #[serde(rename = "instId")]
    inst_id: String,
}

#[derive(Debug, Deserialize)]
struct OkxTickerData {
    last: RawNumber,
    ts: RawNumber,
}

fn leg_update(leg: Leg, price: &RawNumber, ts: &RawNumber) -> Option<LegUpdate> {
    let timestamp_ms = ts.as_millis()?;
    Some(LegUpdate::new(leg, price.as_price(), timestamp_ms))
}

/// Message recognition for one exchange.
pub trait TickParser: Send + Sync {
    fn exchange(&self) -> Exchange;

    /// True if the message has this exchange's data-bearing top-level shape,
    /// whether or not its fields turn out to be usable.
    fn is_relevant(&self, msg: &Value) -> bool;

    /// Extract a single-leg update, or `None` for anything unrecognized.
    fn parse(&self, msg: &Value) -> Option<LegUpdate>;
}

/// Binance spot `aggTrade` / futures `continuous_kline` streams.
#[derive(Debug, Default, Clone)]
pub struct BinanceParser;

impl TickParser for BinanceParser {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    fn is_relevant(&self, msg: &Value) -> bool {
        msg.get("e").is_some()
    }

    fn parse(&self, msg: &Value) -> Option<LegUpdate> {
        match msg.get("e").and_then(Value::as_str)? {
            BINANCE_AGG_TRADE => {
                let trade = BinanceAggTrade::deserialize(msg).ok()?;
                leg_update(Leg::Spot, &trade.price, &trade.event_time)
            }
            BINANCE_CONTINUOUS_KLINE => {
                let kline = BinanceContinuousKline::deserialize(msg).ok()?.kline;
                leg_update(Leg::Future, &kline.close, &kline.close_time)
            }
            _ => None,
        }
    }
}

/// Bybit v5 `tickers.*` topics.
#[derive(Debug, Clone)]
pub struct BybitParser {
    spot_topic: String,
}

impl BybitParser {
    pub fn new(spot_topic: impl Into<String>) -> Self {
        Self {
            spot_topic: spot_topic.into(),
        }
    }
}

impl TickParser for BybitParser {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    fn is_relevant(&self, msg: &Value) -> bool {
        msg.get("topic").is_some()
    }

    fn parse(&self, msg: &Value) -> Option<LegUpdate> {
        let ticker = BybitTicker::deserialize(msg).ok()?;
        let leg = if ticker.topic == self.spot_topic {
            Leg::Spot
        } else {
            Leg::Future
        };
        leg_update(leg, &ticker.data.last_price, &ticker.ts)
    }
}

/// OKX v5 `tickers` channel.
#[derive(Debug, Clone)]
pub struct OkxParser {
    spot_inst_id: String,
}

impl OkxParser {
    pub fn new(spot_inst_id: impl Into<String>) -> Self {
        Self {
            spot_inst_id: spot_inst_id.into(),
        }
    }
}

impl TickParser for OkxParser {
    fn exchange(&self) -> Exchange {
        Exchange::Okx
    }

    fn is_relevant(&self, msg: &Value) -> bool {
        msg.get("data").is_some()
    }

    fn parse(&self, msg: &Value) -> Option<LegUpdate> {
        let ticker = OkxTicker::deserialize(msg).ok()?;
        let first = ticker.data.first()?;
        let leg = if ticker.arg.inst_id == self.spot_inst_id {
            Leg::Spot
        } else {
            Leg::Future
        };
        leg_update(leg, &first.last, &first.ts)
    }
}

/// Result of running one raw message through its exchange's parser.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseOutcome {
    /// Message had a data-bearing top-level shape for the exchange.
    pub relevant: bool,
    pub update: Option<LegUpdate>,
}

/// Parser strategy per tracked exchange.
pub struct ParserTable {
    parsers: HashMap<Exchange, Box<dyn TickParser>>,
}

impl ParserTable {
    /// Build parsers for every tracked exchange, keyed to `symbol`'s spot
    /// instruments.
    pub fn new(symbol: &TrackedSymbol) -> Self {
        let parsers: Vec<Box<dyn TickParser>> = vec![
            Box::new(BinanceParser),
            Box::new(BybitParser::new(symbol.bybit_spot_topic())),
            Box::new(OkxParser::new(symbol.okx_spot_inst_id())),
        ];
        Self::from_parsers(parsers)
    }

    pub fn from_parsers(parsers: Vec<Box<dyn TickParser>>) -> Self {
        Self {
            parsers: parsers.into_iter().map(|p| (p.exchange(), p)).collect(),
        }
    }

    /// Parse an already-decoded message. Exchanges without a parser never
    /// produce anything.
    pub fn parse(&self, exchange: Exchange, msg: &Value) -> ParseOutcome {
        let Some(parser) = self.parsers.get(&exchange) else {
            return ParseOutcome::default();
        };

        let outcome = ParseOutcome {
            relevant: parser.is_relevant(msg),
            update: parser.parse(msg),
        };
        if outcome.relevant && outcome.update.is_none() {
            debug!(%exchange, "Relevant message without a usable leg update");
        }
        outcome
    }

    /// Decode a raw text frame and parse it.
    ///
    /// Only invalid JSON is an error; shape mismatches are an empty outcome.
    pub fn parse_text(&self, exchange: Exchange, raw: &str) -> FeedResult<ParseOutcome> {
        let msg: Value = serde_json::from_str(raw)?;
        Ok(self.parse(exchange, &msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> ParserTable {
        ParserTable::new(&TrackedSymbol::new("BTCUSDT").unwrap())
    }

    #[test]
    fn test_binance_agg_trade_is_spot() {
        let msg = json!({"e": "aggTrade", "p": "42000.5", "E": 1700000000000i64});
        let update = BinanceParser.parse(&msg).unwrap();

        assert_eq!(update, LegUpdate::spot("42000.5", 1_700_000_000_000));
    }

    #[test]
    fn test_binance_continuous_kline_is_future() {
        let msg = json!({"e": "continuous_kline", "k": {"c": "42010.0", "T": 1700000005000i64}});
        let update = BinanceParser.parse(&msg).unwrap();

        assert_eq!(update, LegUpdate::future("42010.0", 1_700_000_005_000));
    }

    #[test]
    fn test_binance_other_event_relevant_but_empty() {
        let msg = json!({"e": "trade", "p": "1", "E": 1});
        let outcome = table().parse(Exchange::Binance, &msg);

        assert!(outcome.relevant);
        assert!(outcome.update.is_none());
    }

    #[test]
    fn test_binance_missing_kline_fields() {
        let msg = json!({"e": "continuous_kline", "k": {"c": "42010.0"}});
        let outcome = table().parse(Exchange::Binance, &msg);

        assert!(outcome.relevant);
        assert!(outcome.update.is_none());
    }

    #[test]
    fn test_bybit_spot_topic() {
        let msg = json!({
            "topic": "tickers.BTCUSDT",
            "ts": 1700000000000i64,
            "data": {"lastPrice": "42000.5"}
        });
        let update = table().parse(Exchange::Bybit, &msg).update.unwrap();

        assert_eq!(update, LegUpdate::spot("42000.5", 1_700_000_000_000));
    }

    #[test]
    fn test_bybit_other_topic_is_future() {
        let msg = json!({
            "topic": "tickers.BTCUSDZ23",
            "ts": 1700000000000i64,
            "data": {"lastPrice": "42000.5"}
        });
        let update = table().parse(Exchange::Bybit, &msg).update.unwrap();

        assert_eq!(update.leg, Leg::Future);
    }

    #[test]
    fn test_bybit_subscribe_ack_not_relevant() {
        let msg = json!({"success": true, "ret_msg": "subscribe", "op": "subscribe", "conn_id": "x"});
        let outcome = table().parse(Exchange::Bybit, &msg);

        assert_eq!(outcome, ParseOutcome::default());
    }

    #[test]
    fn test_okx_spot_and_future() {
        let spot = json!({
            "arg": {"channel": "tickers", "instId": "BTC-USDT"},
            "data": [{"instId": "BTC-USDT", "last": "42000.5", "ts": "1700000000000"}]
        });
        let future = json!({
            "arg": {"channel": "tickers", "instId": "BTC-USDT-231229"},
            "data": [{"instId": "BTC-USDT-231229", "last": "42100.1", "ts": "1700000000500"}]
        });

        let table = table();
        assert_eq!(
            table.parse(Exchange::Okx, &spot).update,
            Some(LegUpdate::spot("42000.5", 1_700_000_000_000))
        );
        assert_eq!(
            table.parse(Exchange::Okx, &future).update,
            Some(LegUpdate::future("42100.1", 1_700_000_000_500))
        );
    }

    #[test]
    fn test_okx_subscribe_event_not_relevant() {
        let msg = json!({"event": "subscribe", "arg": {"channel": "tickers", "instId": "BTC-USDT"}});
        assert!(!table().parse(Exchange::Okx, &msg).relevant);
    }

    #[test]
    fn test_okx_empty_data_relevant_but_empty() {
        let msg = json!({"arg": {"instId": "BTC-USDT"}, "data": []});
        let outcome = table().parse(Exchange::Okx, &msg);

        assert!(outcome.relevant);
        assert!(outcome.update.is_none());
    }

    #[test]
    fn test_shapes_are_exchange_specific() {
        // A Binance-shaped message means nothing on an OKX connection.
        let msg = json!({"e": "aggTrade", "p": "42000.5", "E": 1700000000000i64});
        assert_eq!(table().parse(Exchange::Okx, &msg), ParseOutcome::default());
    }

    #[test]
    fn test_numeric_price_kept_verbatim() {
        let msg = json!({"e": "aggTrade", "p": 42000.5, "E": 1700000000000i64});
        let update = BinanceParser.parse(&msg).unwrap();
        assert_eq!(update.price, "42000.5");
    }

    #[test]
    fn test_parse_text_invalid_json() {
        assert!(table().parse_text(Exchange::Binance, "not json").is_err());
        assert!(table().parse_text(Exchange::Binance, "{}").unwrap() == ParseOutcome::default());
    }
}
