//! Console table of recent observations.

use crate::config::RenderConfig;
use basis_core::{Observation, ObservationSeries, SeriesRenderer, SinkError};
use std::io::Write;

const HEADERS: [&str; 5] = ["Time", "Exchange", "Spot", "Future", "Basis"];

/// ANSI clear screen followed by cursor home.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Draws the last `window` observations to stdout.
#[derive(Debug, Clone)]
pub struct ConsoleRenderer {
    enabled: bool,
    clear_screen: bool,
}

impl ConsoleRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            enabled: config.enabled,
            clear_screen: config.clear_screen,
        }
    }
}

impl SeriesRenderer for ConsoleRenderer {
    fn render(&self, series: &ObservationSeries, window: usize) -> Result<(), SinkError> {
        if !self.enabled {
            return Ok(());
        }

        let table = render_table(series.tail(window));
        let mut out = std::io::stdout().lock();
        if self.clear_screen {
            out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        out.write_all(table.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

fn cells(observation: &Observation) -> [String; 5] {
    [
        observation.time_label(),
        observation.exchange.to_string(),
        observation.spot.to_string(),
        observation.future.to_string(),
        observation.basis.to_string(),
    ]
}

/// Bordered table with centered cells. Always ends with a newline.
pub fn render_table(rows: &[Observation]) -> String {
    let body: Vec<[String; 5]> = rows.iter().map(cells).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let border = {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };

    let format_row = |row: &[&str]| {
        let mut line = String::from("|");
        for (cell, width) in row.iter().zip(widths) {
            line.push_str(&format!(" {cell:^width$} |"));
        }
        line
    };

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    out.push_str(&format_row(&HEADERS));
    out.push('\n');
    out.push_str(&border);
    out.push('\n');
    for row in &body {
        let refs: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&format_row(&refs));
        out.push('\n');
    }
    if !body.is_empty() {
        out.push_str(&border);
        out.push('\n');
    }
    out
}
