//! Mock WebSocket server for integration tests.
//!
//! Provides a simple WebSocket server that can:
//! - Accept connections
//! - Play scripted exchange messages, optionally after a subscribe request
//! - Record received messages

use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// What the server does on every accepted connection.
#[derive(Debug, Clone)]
struct Script {
    await_subscribe: bool,
    frames: Vec<Message>,
}

/// A mock WebSocket server for testing.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    messages: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
}

impl MockWsServer {
    /// Serve `frames` to every client right after the handshake.
    pub async fn start(frames: Vec<&str>) -> Self {
        Self::spawn(Script {
            await_subscribe: false,
            frames: text_frames(frames),
        })
        .await
    }

    /// Serve `frames` once the client has sent its first text message.
    pub async fn start_after_subscribe(frames: Vec<&str>) -> Self {
        Self::spawn(Script {
            await_subscribe: true,
            frames: text_frames(frames),
        })
        .await
    }

    /// Close every connection right after the handshake.
    pub async fn start_closing() -> Self {
        Self::spawn(Script {
            await_subscribe: false,
            frames: vec![Message::Close(None)],
        })
        .await
    }

    async fn spawn(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let messages: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(VecDeque::new()));
        let connections: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let messages_clone = messages.clone();
        let connections_clone = connections.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        let messages = messages_clone.clone();
                        let connections = connections_clone.clone();
                        tokio::spawn(handle_connection(stream, script.clone(), messages, connections));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            messages,
            connections,
        }
    }

    /// Get the server's WebSocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Get the number of connections received.
    pub async fn connection_count(&self) -> u32 {
        *self.connections.lock().await
    }

    /// Get all received messages.
    pub async fn received_messages(&self) -> Vec<String> {
        self.messages.lock().await.iter().cloned().collect()
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

fn text_frames(frames: Vec<&str>) -> Vec<Message> {
    frames
        .into_iter()
        .map(|f| Message::Text(f.to_string()))
        .collect()
}

async fn handle_connection(
    stream: TcpStream,
    script: Script,
    messages: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
) {
    {
        let mut count = connections.lock().await;
        *count += 1;
    }

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();
    let mut pending = Some(script.frames);

    if !script.await_subscribe {
        for frame in pending.take().unwrap_or_default() {
            if write.send(frame).await.is_err() {
                return;
            }
        }
    }

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                messages.lock().await.push_back(text);

                for frame in pending.take().unwrap_or_default() {
                    if write.send(frame).await.is_err() {
                        return;
                    }
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }
}
