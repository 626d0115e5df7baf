//! Transport seam and its tokio-tungstenite implementation.
//!
//! A `Connection` is short-lived: the supervisor opens it, optionally sends
//! one subscribe payload, reads until it has what it needs, then closes it.
//! Protocol-level frames (ping/pong) are handled here so callers only ever
//! see text payloads.

use crate::error::{WsError, WsResult};
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::pin::Pin;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opens connections to streaming endpoints.
pub trait Transport: Send + Sync {
    /// Establish a connection to `endpoint`.
    ///
    /// Fails with `WsError::ConnectionFailed` on refusal, DNS or TLS errors.
    fn connect<'a>(&'a self, endpoint: &'a str) -> BoxFuture<'a, WsResult<Box<dyn Connection>>>;
}

/// An established streaming connection.
pub trait Connection: Send {
    /// Send one text frame.
    fn send<'a>(&'a mut self, text: &'a str) -> BoxFuture<'a, WsResult<()>>;

    /// Wait for the next text payload.
    ///
    /// May wait indefinitely on a silent connection. Fails with
    /// `WsError::ConnectionClosed` when the peer closes or the stream ends.
    fn receive(&mut self) -> BoxFuture<'_, WsResult<String>>;

    /// Close the connection. Closing an already-closed connection is not an error.
    fn close(&mut self) -> BoxFuture<'_, WsResult<()>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport backed by tokio-tungstenite.
#[derive(Debug, Clone)]
pub struct WsTransport {
    /// Disable Nagle's algorithm on the underlying TCP socket.
    disable_nagle: bool,
}

impl WsTransport {
    pub fn new() -> Self {
        Self {
            disable_nagle: true,
        }
    }

    async fn open(&self, endpoint: &str) -> WsResult<WsConnection> {
        info!(endpoint = %endpoint, "Connecting to WebSocket");

        let (stream, _response) =
            connect_async_tls_with_config(endpoint, None, self.disable_nagle, None)
                .await
                .map_err(|e| WsError::ConnectionFailed(format!("{endpoint}: {e}")))?;

        debug!(endpoint = %endpoint, "WebSocket connected");
        Ok(WsConnection {
            endpoint: endpoint.to_string(),
            stream,
        })
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WsTransport {
    fn connect<'a>(&'a self, endpoint: &'a str) -> BoxFuture<'a, WsResult<Box<dyn Connection>>> {
        Box::pin(async move {
            let conn = self.open(endpoint).await?;
            Ok(Box::new(conn) as Box<dyn Connection>)
        })
    }
}

/// Live WebSocket connection.
pub struct WsConnection {
    endpoint: String,
    stream: WsStream,
}

impl WsConnection {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn next_text(&mut self) -> WsResult<String> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Binary(data))) => {
                    return Ok(String::from_utf8_lossy(&data).into_owned());
                }
                Some(Ok(Message::Ping(data))) => {
                    debug!(endpoint = %self.endpoint, "Received ping, sending pong");
                    self.stream.send(Message::Pong(data)).await?;
                }
                Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (f.code.into(), f.reason.to_string()))
                        .unwrap_or((1000, "Normal close".to_string()));
                    warn!(endpoint = %self.endpoint, code, %reason, "WebSocket closed by server");
                    return Err(WsError::ConnectionClosed { code, reason });
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    return Err(WsError::ConnectionClosed {
                        code: 1006,
                        reason: "Stream ended".to_string(),
                    });
                }
            }
        }
    }
}

impl Connection for WsConnection {
    fn send<'a>(&'a mut self, text: &'a str) -> BoxFuture<'a, WsResult<()>> {
        Box::pin(async move {
            self.stream
                .send(Message::Text(text.to_string()))
                .await
                .map_err(|e| WsError::SendFailed(e.to_string()))
        })
    }

    fn receive(&mut self) -> BoxFuture<'_, WsResult<String>> {
        Box::pin(self.next_text())
    }

    fn close(&mut self) -> BoxFuture<'_, WsResult<()>> {
        Box::pin(async move {
            use tokio_tungstenite::tungstenite::Error;

            match self.stream.close(None).await {
                Ok(()) | Err(Error::ConnectionClosed) | Err(Error::AlreadyClosed) => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}
