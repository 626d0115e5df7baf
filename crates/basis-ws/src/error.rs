//! WebSocket error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),
}

impl WsError {
    /// True for an orderly or abrupt close of an established connection.
    pub fn is_closed(&self) -> bool {
        use tokio_tungstenite::tungstenite::Error;

        matches!(
            self,
            Self::ConnectionClosed { .. }
                | Self::Tungstenite(Error::ConnectionClosed | Error::AlreadyClosed)
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "connect",
            _ if self.is_closed() => "closed",
            Self::SendFailed(_) => "send",
            _ => "transport",
        }
    }
}

pub type WsResult<T> = Result<T, WsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::Error;

    #[test]
    fn test_closed_variants() {
        let closed = WsError::ConnectionClosed {
            code: 1000,
            reason: "bye".to_string(),
        };
        assert!(closed.is_closed());
        assert_eq!(closed.kind(), "closed");

        let already = WsError::from(Error::AlreadyClosed);
        assert!(already.is_closed());
        assert_eq!(already.kind(), "closed");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(WsError::ConnectionFailed("dns".into()).kind(), "connect");
        assert_eq!(WsError::SendFailed("broken pipe".into()).kind(), "send");
        assert_eq!(WsError::Transport("reset".into()).kind(), "transport");
        assert!(!WsError::Transport("reset".into()).is_closed());
    }
}
