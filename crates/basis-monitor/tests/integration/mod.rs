//! Integration tests for basis-monitor.
//!
//! These tests drive the supervisor against local WebSocket servers:
//! - Subscribe payload delivery
//! - Cross-connection pairing per exchange
//! - CSV log contents after full cycles

pub mod common;
