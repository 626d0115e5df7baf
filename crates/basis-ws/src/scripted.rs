//! In-memory transport replaying canned frames.
//!
//! Each endpoint is registered with a script; every `connect` to that
//! endpoint starts a fresh replay, so repeated supervisor cycles see the
//! same traffic. All connects, sends and closes are recorded.

use crate::connection::{BoxFuture, Connection, Transport};
use crate::error::{WsError, WsResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// One step of a scripted connection.
#[derive(Debug, Clone)]
pub enum ScriptedFrame {
    /// Deliver a text payload.
    Text(String),
    /// Peer closes the connection.
    Close,
    /// Transport-level failure.
    Fail(String),
}

impl ScriptedFrame {
    pub fn text(payload: impl Into<String>) -> Self {
        Self::Text(payload.into())
    }
}

#[derive(Debug, Clone)]
enum Script {
    Refuse(String),
    Frames(Vec<ScriptedFrame>),
}

/// Everything the transport observed.
#[derive(Debug, Clone, Default)]
pub struct TransportLog {
    pub connects: Vec<String>,
    /// (endpoint, payload) pairs.
    pub sent: Vec<(String, String)>,
    pub closes: Vec<String>,
}

/// Transport serving scripted frames per endpoint.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    log: Arc<Mutex<TransportLog>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the frames delivered on every connection to `endpoint`.
    ///
    /// Once the frames run out the peer closes the connection.
    pub fn with_frames(self, endpoint: &str, frames: Vec<ScriptedFrame>) -> Self {
        self.scripts
            .lock()
            .insert(endpoint.to_string(), Script::Frames(frames));
        self
    }

    /// Make every connection attempt to `endpoint` fail.
    pub fn refusing(self, endpoint: &str, reason: &str) -> Self {
        self.scripts
            .lock()
            .insert(endpoint.to_string(), Script::Refuse(reason.to_string()));
        self
    }

    /// Snapshot of recorded activity.
    pub fn log(&self) -> TransportLog {
        self.log.lock().clone()
    }
}

impl Transport for ScriptedTransport {
    fn connect<'a>(&'a self, endpoint: &'a str) -> BoxFuture<'a, WsResult<Box<dyn Connection>>> {
        Box::pin(async move {
            let script = self.scripts.lock().get(endpoint).cloned();
            match script {
                Some(Script::Frames(frames)) => {
                    self.log.lock().connects.push(endpoint.to_string());
                    Ok(Box::new(ScriptedConnection {
                        endpoint: endpoint.to_string(),
                        frames: frames.into(),
                        closed: false,
                        log: self.log.clone(),
                    }) as Box<dyn Connection>)
                }
                Some(Script::Refuse(reason)) => Err(WsError::ConnectionFailed(format!(
                    "{endpoint}: {reason}"
                ))),
                None => Err(WsError::ConnectionFailed(format!(
                    "{endpoint}: no script registered"
                ))),
            }
        })
    }
}

struct ScriptedConnection {
    endpoint: String,
    frames: VecDeque<ScriptedFrame>,
    closed: bool,
    log: Arc<Mutex<TransportLog>>,
}

impl Connection for ScriptedConnection {
    fn send<'a>(&'a mut self, text: &'a str) -> BoxFuture<'a, WsResult<()>> {
        Box::pin(async move {
            if self.closed {
                return Err(WsError::SendFailed("connection closed".to_string()));
            }
            self.log
                .lock()
                .sent
                .push((self.endpoint.clone(), text.to_string()));
            Ok(())
        })
    }

    fn receive(&mut self) -> BoxFuture<'_, WsResult<String>> {
        Box::pin(async move {
            // Yield so sibling connections interleave like real I/O would.
            tokio::task::yield_now().await;

            match self.frames.pop_front() {
                Some(ScriptedFrame::Text(text)) => Ok(text),
                Some(ScriptedFrame::Fail(reason)) => Err(WsError::Transport(reason)),
                Some(ScriptedFrame::Close) | None => {
                    self.closed = true;
                    Err(WsError::ConnectionClosed {
                        code: 1000,
                        reason: "Script finished".to_string(),
                    })
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, WsResult<()>> {
        Box::pin(async move {
            self.closed = true;
            self.log.lock().closes.push(self.endpoint.clone());
            Ok(())
        })
    }
}
