//! Static feed subscription description.

use crate::Exchange;
use serde::{Deserialize, Serialize};

/// One transport connection plus its optional subscribe payload.
///
/// Several specs may share the same exchange (one per market leg).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSpec {
    pub exchange: Exchange,
    /// WebSocket endpoint (`ws://` or `wss://`).
    pub endpoint: String,
    /// Payload sent once right after connecting; `None` means send nothing.
    #[serde(default, rename = "subscribe", skip_serializing_if = "Option::is_none")]
    pub subscribe_request: Option<serde_json::Value>,
}

impl SubscriptionSpec {
    pub fn new(exchange: Exchange, endpoint: impl Into<String>) -> Self {
        Self {
            exchange,
            endpoint: endpoint.into(),
            subscribe_request: None,
        }
    }

    pub fn with_request(mut self, request: serde_json::Value) -> Self {
        self.subscribe_request = Some(request);
        self
    }

    /// Serialized subscribe payload, if any.
    ///
    /// An empty JSON object or string counts as "no request".
    pub fn subscribe_text(&self) -> Option<String> {
        match &self.subscribe_request {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) if s.is_empty() => None,
            Some(serde_json::Value::Object(m)) if m.is_empty() => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(v) => Some(v.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_text_none_when_empty() {
        let spec = SubscriptionSpec::new(Exchange::Binance, "wss://example");
        assert_eq!(spec.subscribe_text(), None);

        let spec = spec.with_request(json!(""));
        assert_eq!(spec.subscribe_text(), None);

        let spec = SubscriptionSpec::new(Exchange::Binance, "wss://example").with_request(json!({}));
        assert_eq!(spec.subscribe_text(), None);
    }

    #[test]
    fn test_subscribe_text_serializes_object() {
        let spec = SubscriptionSpec::new(Exchange::Bybit, "wss://stream.bybit.com/v5/public/spot")
            .with_request(json!({"op": "subscribe", "args": ["tickers.BTCUSDT"]}));

        let text = spec.subscribe_text().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["op"], "subscribe");
        assert_eq!(parsed["args"][0], "tickers.BTCUSDT");
    }
}
