//! WebSocket transport for exchange price feeds.
//!
//! Provides the transport collaborator used by the feed supervisor:
//! - `Transport` / `Connection`: dyn-compatible connect/send/receive/close
//! - `WsTransport`: tokio-tungstenite implementation (TLS, ping/pong)
//! - `ScriptedTransport`: in-memory transport replaying canned frames
//!
//! There is no reconnection here; the supervisor restarts whole
//! batches of connections on its own cadence.

pub mod connection;
pub mod error;
pub mod scripted;

pub use connection::{BoxFuture, Connection, Transport, WsConnection, WsTransport};
pub use error::{WsError, WsResult};
pub use scripted::{ScriptedFrame, ScriptedTransport, TransportLog};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
