//! Application configuration.

use crate::error::{AppError, AppResult};
use basis_core::{Exchange, SubscriptionSpec, TrackedSymbol};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Console table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Draw the table on stdout after every observation. Default: true.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of most recent rows shown. Default: 9.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Clear the terminal before each redraw. Default: true.
    #[serde(default = "default_true")]
    pub clear_screen: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: default_window(),
            clear_screen: true,
        }
    }
}

/// Observation log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// CSV file rewritten after every observation. Default: ./monitor_log.csv
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tracked pair, e.g. "BTCUSDT".
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Sleep between feed batches, in seconds. Default: 45.
    #[serde(default = "default_restart_interval_secs")]
    pub restart_interval_secs: u64,

    /// Bybit inverse contract used by the reference subscriptions.
    #[serde(default = "default_bybit_future_symbol")]
    pub bybit_future_symbol: String,

    /// OKX dated future used by the reference subscriptions.
    #[serde(default = "default_okx_future_inst_id")]
    pub okx_future_inst_id: String,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Feed connections. Empty means the reference list for `symbol`.
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionSpec>,
}

fn default_true() -> bool {
    true
}

fn default_window() -> usize {
    9
}

fn default_log_path() -> PathBuf {
    PathBuf::from("./monitor_log.csv")
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_restart_interval_secs() -> u64 {
    45
}

fn default_bybit_future_symbol() -> String {
    "BTCUSDZ23".to_string()
}

fn default_okx_future_inst_id() -> String {
    "BTC-USDT-231229".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            restart_interval_secs: default_restart_interval_secs(),
            bybit_future_symbol: default_bybit_future_symbol(),
            okx_future_inst_id: default_okx_future_inst_id(),
            render: RenderConfig::default(),
            persistence: PersistenceConfig::default(),
            subscriptions: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        self.tracked_symbol()?;

        if self.render.window == 0 {
            return Err(AppError::Config("render.window must be at least 1".to_string()));
        }
        if self.restart_interval_secs == 0 {
            return Err(AppError::Config(
                "restart_interval_secs must be at least 1".to_string(),
            ));
        }

        let subscriptions = self.effective_subscriptions()?;
        if subscriptions.is_empty() {
            return Err(AppError::Config("no subscriptions configured".to_string()));
        }
        for spec in &subscriptions {
            if !(spec.endpoint.starts_with("ws://") || spec.endpoint.starts_with("wss://")) {
                return Err(AppError::Config(format!(
                    "{} endpoint is not a WebSocket URL: {}",
                    spec.exchange, spec.endpoint
                )));
            }
        }
        Ok(())
    }

    pub fn tracked_symbol(&self) -> AppResult<TrackedSymbol> {
        Ok(TrackedSymbol::new(&self.symbol)?)
    }

    pub fn restart_interval(&self) -> Duration {
        Duration::from_secs(self.restart_interval_secs)
    }

    /// Configured subscriptions, or the reference list when none are given.
    pub fn effective_subscriptions(&self) -> AppResult<Vec<SubscriptionSpec>> {
        if !self.subscriptions.is_empty() {
            return Ok(self.subscriptions.clone());
        }
        Ok(self.reference_subscriptions(&self.tracked_symbol()?))
    }

    /// Six connections: spot and future for each exchange.
    pub fn reference_subscriptions(&self, symbol: &TrackedSymbol) -> Vec<SubscriptionSpec> {
        let lower = symbol.concat().to_lowercase();

        vec![
            SubscriptionSpec::new(
                Exchange::Binance,
                format!("wss://fstream.binance.com/ws/{lower}_current_quarter@continuousKline_1m"),
            ),
            SubscriptionSpec::new(
                Exchange::Binance,
                format!("wss://stream.binance.com:9443/ws/{lower}@aggTrade"),
            ),
            SubscriptionSpec::new(Exchange::Bybit, "wss://stream.bybit.com/v5/public/spot")
                .with_request(json!({
                    "op": "subscribe",
                    "args": [symbol.bybit_spot_topic()],
                })),
            SubscriptionSpec::new(Exchange::Bybit, "wss://stream.bybit.com/v5/public/inverse")
                .with_request(json!({
                    "op": "subscribe",
                    "args": [format!("tickers.{}", self.bybit_future_symbol)],
                })),
            SubscriptionSpec::new(Exchange::Okx, "wss://ws.okx.com:8443/ws/v5/public")
                .with_request(json!({
                    "op": "subscribe",
                    "args": [{"channel": "tickers", "instId": symbol.okx_spot_inst_id()}],
                })),
            SubscriptionSpec::new(Exchange::Okx, "wss://ws.okx.com:8443/ws/v5/public")
                .with_request(json!({
                    "op": "subscribe",
                    "args": [{"channel": "tickers", "instId": self.okx_future_inst_id}],
                })),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.symbol, "BTCUSDT");
        assert_eq!(config.restart_interval(), Duration::from_secs(45));
        assert_eq!(config.render.window, 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reference_subscriptions() {
        let config = AppConfig::default();
        let subs = config.effective_subscriptions().unwrap();

        assert_eq!(subs.len(), 6);
        assert_eq!(
            subs[0].endpoint,
            "wss://fstream.binance.com/ws/btcusdt_current_quarter@continuousKline_1m"
        );
        assert_eq!(subs[1].subscribe_text(), None);
        let bybit_spot: serde_json::Value =
            serde_json::from_str(&subs[2].subscribe_text().unwrap()).unwrap();
        assert_eq!(bybit_spot, json!({"op": "subscribe", "args": ["tickers.BTCUSDT"]}));
        assert!(subs[3].subscribe_text().unwrap().contains("tickers.BTCUSDZ23"));
        assert!(subs[4].subscribe_text().unwrap().contains(r#""instId":"BTC-USDT""#));
        assert!(subs[5].subscribe_text().unwrap().contains("BTC-USDT-231229"));
    }

    #[test]
    fn test_parse_explicit_subscriptions() {
        let config = AppConfig::from_toml(
            r#"
            symbol = "ETHUSDT"
            restart_interval_secs = 10

            [render]
            window = 5

            [[subscriptions]]
            exchange = "Binance"
            endpoint = "ws://127.0.0.1:9001"

            [[subscriptions]]
            exchange = "Okx"
            endpoint = "wss://ws.okx.com:8443/ws/v5/public"
            subscribe = { op = "subscribe", args = [{ channel = "tickers", instId = "ETH-USDT" }] }
            "#,
        )
        .unwrap();

        assert_eq!(config.render.window, 5);
        assert!(config.render.enabled);
        assert_eq!(config.subscriptions.len(), 2);
        assert_eq!(config.subscriptions[1].exchange, Exchange::Okx);
        assert!(config.subscriptions[1]
            .subscribe_text()
            .unwrap()
            .contains("ETH-USDT"));
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = AppConfig::from_toml("[render]\nwindow = 0\n").unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("window")));
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(AppConfig::from_toml("restart_interval_secs = 0").is_err());
    }

    #[test]
    fn test_rejects_non_ws_endpoint() {
        let err = AppConfig::from_toml(
            r#"
            [[subscriptions]]
            exchange = "Bybit"
            endpoint = "https://stream.bybit.com"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("WebSocket")));
    }

    #[test]
    fn test_rejects_unknown_quote() {
        assert!(AppConfig::from_toml(r#"symbol = "BTCEUR""#).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load("/nonexistent/basis/config.toml").unwrap();
        assert_eq!(config.effective_subscriptions().unwrap().len(), 6);
    }
}
