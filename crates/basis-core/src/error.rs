//! Error types for basis-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("Unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Basis overflow: {future} - {spot}")]
    BasisOverflow { spot: String, future: String },
}

/// Failure reported by a render or persist collaborator.
///
/// Never fatal to the emitter; callers log it and carry on.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Render failed: {0}")]
    Render(String),

    #[error("Persist failed: {0}")]
    Persist(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
