//! CSV writer for the observation series.
//!
//! Every persist call rewrites the whole file: the series is written to a
//! sibling temp file which is then renamed over the target, so a reader
//! never sees a half-written log.

use crate::error::{PersistenceError, PersistenceResult};
use basis_core::{Observation, ObservationSeries, SeriesPersister, SinkError};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Header line. The leading empty column holds the row index.
pub const CSV_HEADER: &str = ",Time,Exchange,Spot,Future,Basis";

const HEADER_RECORD: [&str; 6] = ["", "Time", "Exchange", "Spot", "Future", "Basis"];

/// Full-rewrite CSV persister.
#[derive(Debug, Clone)]
pub struct CsvSeriesWriter {
    path: PathBuf,
}

impl CsvSeriesWriter {
    /// Create a writer for `path`. The parent directory is created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(?e, dir = %parent.display(), "Failed to create directory");
            }
        }

        info!(path = %path.display(), "CSV observation log");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PersistenceResult<PathBuf> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| PersistenceError::InvalidPath(self.path.display().to_string()))?;

        let mut tmp = name.to_os_string();
        tmp.push(".tmp");
        Ok(self.path.with_file_name(tmp))
    }

    /// Write every observation, oldest first, replacing the file contents.
    pub fn write_all(&self, series: &ObservationSeries) -> PersistenceResult<()> {
        let tmp = self.temp_path()?;

        {
            let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(&tmp)?));
            writer.write_record(HEADER_RECORD)?;
            for (index, observation) in series.iter().enumerate() {
                writer.write_record(row_record(index, observation))?;
            }
            writer.flush()?;
        }

        std::fs::rename(&tmp, &self.path)?;

        debug!(
            path = %self.path.display(),
            rows = series.len(),
            "Rewrote CSV observation log"
        );
        Ok(())
    }
}

impl SeriesPersister for CsvSeriesWriter {
    fn persist(&self, series: &ObservationSeries) -> Result<(), SinkError> {
        self.write_all(series).map_err(SinkError::from)
    }
}

/// One data row: `index,time,exchange,spot,future,basis`.
fn row_record(index: usize, observation: &Observation) -> [String; 6] {
    [
        index.to_string(),
        observation.time_label(),
        observation.exchange.to_string(),
        observation.spot.to_string(),
        observation.future.to_string(),
        observation.basis.to_string(),
    ]
}
