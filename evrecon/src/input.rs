//! Event log reading.
//!
//! Event logs are comma-separated text with a header row:
//!
//! ```text
//! timestamp,x,y,polarity
//! 0,12,40,1
//! 3,13,40,0
//! ```
//!
//! Columns are located by name, so they may appear in any order and extra
//! columns are ignored. Blank lines are skipped. Every record is normalized
//! through [`Event::from_raw`], which mirrors `y` and folds the polarity.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ReconstructError, ReconstructResult};
use crate::event::Event;
use crate::grid::Dimensions;

const TIMESTAMP: &str = "timestamp";
const X: &str = "x";
const Y: &str = "y";
const POLARITY: &str = "polarity";

/// Positions of the required columns within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    timestamp: usize,
    x: usize,
    y: usize,
    polarity: usize,
}

impl ColumnLayout {
    fn from_header(header: &str) -> ReconstructResult<Self> {
        let names: Vec<&str> = header
            .trim_start_matches('\u{feff}')
            .split(',')
            .map(clean_field)
            .collect();

        let find = |column: &'static str| {
            names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(column))
                .ok_or(ReconstructError::MissingColumn(column))
        };

        Ok(Self {
            timestamp: find(TIMESTAMP)?,
            x: find(X)?,
            y: find(Y)?,
            polarity: find(POLARITY)?,
        })
    }

    /// Minimum number of fields a row needs.
    fn width(&self) -> usize {
        self.timestamp.max(self.x).max(self.y).max(self.polarity) + 1
    }
}

fn clean_field(field: &str) -> &str {
    field.trim().trim_matches('"')
}

/// Reads event logs for a sensor of fixed dimensions.
#[derive(Debug, Clone, Copy)]
pub struct EventReader {
    dimensions: Dimensions,
}

impl EventReader {
    /// Create a reader that validates coordinates against `dimensions`.
    pub fn new(dimensions: Dimensions) -> Self {
        Self { dimensions }
    }

    /// Read all events from a file.
    pub fn read_path(&self, path: &Path) -> ReconstructResult<Vec<Event>> {
        let file = File::open(path).map_err(|e| ReconstructError::io(path, e))?;
        let events = self.read(BufReader::new(file)).map_err(|e| match e {
            ReconstructError::Io { source, .. } => ReconstructError::io(path, source),
            other => other,
        })?;

        debug!(
            path = %path.display(),
            events = events.len(),
            "Read event log"
        );
        Ok(events)
    }

    /// Read all events from a buffered source.
    ///
    /// # Errors
    ///
    /// - [`ReconstructError::InputParse`] for an empty input or a malformed row
    /// - [`ReconstructError::MissingColumn`] if the header lacks a column
    /// - [`ReconstructError::CoordinateOutOfRange`] for a pixel off the sensor
    pub fn read<R: BufRead>(&self, reader: R) -> ReconstructResult<Vec<Event>> {
        let mut lines = reader.lines().enumerate();

        let layout = match lines.next() {
            Some((_, line)) => {
                let header = line.map_err(|e| ReconstructError::io("<events>", e))?;
                ColumnLayout::from_header(&header)?
            }
            None => {
                return Err(ReconstructError::InputParse {
                    line: 1,
                    message: "missing header row".to_string(),
                })
            }
        };

        let mut events = Vec::new();
        let mut last_timestamp = 0u64;
        let mut out_of_order = 0usize;

        for (index, line) in lines {
            let line_number = index + 1;
            let line = line.map_err(|e| ReconstructError::io("<events>", e))?;
            if line.trim().is_empty() {
                continue;
            }

            let event = self.parse_row(&line, line_number, &layout)?;
            if event.timestamp() < last_timestamp {
                out_of_order += 1;
            }
            last_timestamp = event.timestamp();
            events.push(event);
        }

        if out_of_order > 0 {
            warn!(
                out_of_order,
                "Event log is not sorted by timestamp; events are processed in file order"
            );
        }

        Ok(events)
    }

    fn parse_row(
        &self,
        line: &str,
        line_number: usize,
        layout: &ColumnLayout,
    ) -> ReconstructResult<Event> {
        let fields: Vec<&str> = line.split(',').map(clean_field).collect();
        if fields.len() < layout.width() {
            return Err(ReconstructError::InputParse {
                line: line_number,
                message: format!(
                    "expected at least {} fields, found {}",
                    layout.width(),
                    fields.len()
                ),
            });
        }

        let timestamp: u64 = parse_field(fields[layout.timestamp], TIMESTAMP, line_number)?;
        let x: i64 = parse_field(fields[layout.x], X, line_number)?;
        let y: i64 = parse_field(fields[layout.y], Y, line_number)?;
        let polarity: i64 = parse_field(fields[layout.polarity], POLARITY, line_number)?;

        Event::from_raw(timestamp, x, y, polarity, self.dimensions)
    }
}

fn parse_field<T: std::str::FromStr>(
    value: &str,
    column: &str,
    line: usize,
) -> ReconstructResult<T> {
    value.parse().map_err(|_| ReconstructError::InputParse {
        line,
        message: format!("invalid {} '{}'", column, value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Polarity;

    fn reader() -> EventReader {
        EventReader::new(Dimensions::new(16, 16))
    }

    fn read(text: &str) -> ReconstructResult<Vec<Event>> {
        reader().read(text.as_bytes())
    }

    #[test]
    fn test_reads_basic_log() {
        let events = read("timestamp,x,y,polarity\n0,0,0,1\n5,10,10,-1\n").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Event::new(0, 0, 15, Polarity::Positive));
        assert_eq!(events[1], Event::new(5, 10, 5, Polarity::Negative));
    }

    #[test]
    fn test_columns_in_any_order_with_extras() {
        let events =
            read("polarity,extra,y,timestamp,x\n1,foo,2,100,3\n0,bar,0,200,4\n").unwrap();
        assert_eq!(events[0], Event::new(100, 3, 13, Polarity::Positive));
        assert_eq!(events[1], Event::new(200, 4, 15, Polarity::Negative));
    }

    #[test]
    fn test_skips_blank_lines_and_trims() {
        let events = read("timestamp, x, y, polarity\n\n 7 , 1 , 1 , 1 \n\n").unwrap();
        assert_eq!(events, vec![Event::new(7, 1, 14, Polarity::Positive)]);
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        let err = read("").unwrap_err();
        assert!(matches!(err, ReconstructError::InputParse { line: 1, .. }));
    }

    #[test]
    fn test_header_only_yields_no_events() {
        assert!(read("timestamp,x,y,polarity\n").unwrap().is_empty());
    }

    #[test]
    fn test_missing_column() {
        let err = read("timestamp,x,y\n0,1,1\n").unwrap_err();
        assert!(matches!(err, ReconstructError::MissingColumn("polarity")));
    }

    #[test]
    fn test_malformed_value_reports_line() {
        let err = read("timestamp,x,y,polarity\n0,1,1,1\nabc,1,1,1\n").unwrap_err();
        match err {
            ReconstructError::InputParse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("timestamp"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_short_row_reports_line() {
        let err = read("timestamp,x,y,polarity\n0,1\n").unwrap_err();
        assert!(matches!(err, ReconstructError::InputParse { line: 2, .. }));
    }

    #[test]
    fn test_out_of_range_coordinate_rejected() {
        let err = read("timestamp,x,y,polarity\n0,16,0,1\n").unwrap_err();
        assert!(matches!(
            err,
            ReconstructError::CoordinateOutOfRange { x: 16, .. }
        ));
        let err = read("timestamp,x,y,polarity\n0,0,16,1\n").unwrap_err();
        assert!(matches!(
            err,
            ReconstructError::CoordinateOutOfRange { y: 16, .. }
        ));
    }

    #[test]
    fn test_read_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = reader()
            .read_path(&dir.path().join("missing.csv"))
            .unwrap_err();
        assert!(matches!(err, ReconstructError::Io { .. }));
    }

    #[test]
    fn test_read_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        std::fs::write(&path, "timestamp,x,y,polarity\n1,2,3,1\n").unwrap();

        let events = reader().read_path(&path).unwrap();
        assert_eq!(events, vec![Event::new(1, 2, 12, Polarity::Positive)]);
    }
}
