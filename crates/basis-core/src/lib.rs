//! Core domain types for the spot/futures basis monitor.
//!
//! This crate provides fundamental types used throughout the monitor:
//! - `Exchange`, `Leg`, `LegUpdate`: normalized tick vocabulary
//! - `Price`: precision-safe decimal price with two-decimal rounding
//! - `Observation`, `ObservationSeries`: finalized basis data points
//! - `TrackedSymbol`, `SubscriptionSpec`: static feed configuration
//! - `SeriesRenderer`, `SeriesPersister`: collaborator seams for output

pub mod decimal;
pub mod error;
pub mod series;
pub mod sink;
pub mod subscription;
pub mod symbol;
pub mod types;

pub use decimal::Price;
pub use error::{CoreError, Result, SinkError};
pub use series::ObservationSeries;
pub use sink::{SeriesPersister, SeriesRenderer};
pub use subscription::SubscriptionSpec;
pub use symbol::TrackedSymbol;
pub use types::{floor_to_minute, Exchange, Leg, LegUpdate, Observation, OBSERVED_AT_FORMAT};
