//! Feed error types.

use basis_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Invalid price for {exchange} {leg}: {raw}")]
    InvalidPrice {
        exchange: String,
        leg: String,
        raw: String,
    },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;
