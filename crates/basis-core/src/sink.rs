//! Output collaborator seams.
//!
//! The emitter triggers rendering and persistence after each new
//! observation. Both are injected so they can be swapped or mocked;
//! failures are reported back but never stop the emit-then-reset cycle.

use crate::error::SinkError;
use crate::ObservationSeries;

/// Displays the most recent part of the series.
pub trait SeriesRenderer: Send + Sync {
    /// Show the last `window` observations.
    fn render(&self, series: &ObservationSeries, window: usize) -> Result<(), SinkError>;
}

/// Writes the full series to durable storage.
pub trait SeriesPersister: Send + Sync {
    /// Overwrite the stored log with every observation in `series`.
    fn persist(&self, series: &ObservationSeries) -> Result<(), SinkError>;
}
