//! Observation log persistence.
//!
//! Writes the full observation series to a CSV file after every emission,
//! so the file always reflects the complete in-memory history.

pub mod error;
pub mod writer;

pub use error::{PersistenceError, PersistenceResult};
pub use writer::{CsvSeriesWriter, CSV_HEADER};
