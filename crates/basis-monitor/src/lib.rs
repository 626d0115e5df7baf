//! Spot/futures basis monitor.
//!
//! Application that orchestrates all components:
//! - WebSocket feeds for Binance, Bybit and OKX, restarted in batches
//! - Per-exchange leg pairing and basis computation
//! - Console table of recent observations
//! - CSV log of the full observation series

pub mod app;
pub mod config;
pub mod error;
pub mod render;
pub mod supervisor;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use render::{render_table, ConsoleRenderer};
pub use supervisor::{
    ConnectionOutcome, ConnectionReport, ConnectionState, CycleReport, FeedSupervisor, StopReason,
};
