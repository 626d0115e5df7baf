//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] basis_core::CoreError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] basis_ws::WsError),

    #[error("Feed error: {0}")]
    Feed(#[from] basis_feed::FeedError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] basis_telemetry::TelemetryError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] basis_persistence::PersistenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
