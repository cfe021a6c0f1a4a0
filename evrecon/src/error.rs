//! Error types for reconstruction.
//!
//! Every failure is fatal to the run: there is no retry inside the pipeline,
//! so errors carry enough context to be reported directly to the user.
//! Frames exported before the failure stay on disk.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for reconstruction operations.
pub type ReconstructResult<T> = Result<T, ReconstructError>;

/// Errors that can occur while reading events, reconstructing or exporting.
#[derive(Debug, Error)]
pub enum ReconstructError {
    /// A row of the event log could not be parsed.
    #[error("line {line}: {message}")]
    InputParse { line: usize, message: String },

    /// The header row lacks a required column.
    #[error("missing required column '{0}' in event header")]
    MissingColumn(&'static str),

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An event addresses a pixel outside the sensor.
    ///
    /// The coordinates are the raw values from the input.
    #[error("event at ({x}, {y}) is outside the {width}x{height} sensor")]
    CoordinateOutOfRange {
        x: i64,
        y: i64,
        width: u16,
        height: u16,
    },

    /// Encoding or writing a frame failed.
    #[error("failed to export frame {}: {message}", .path.display())]
    Export { path: PathBuf, message: String },

    /// Configuration values are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ReconstructError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ReconstructError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_input_parse() {
        let err = ReconstructError::InputParse {
            line: 12,
            message: "invalid timestamp 'abc'".to_string(),
        };
        assert_eq!(err.to_string(), "line 12: invalid timestamp 'abc'");
    }

    #[test]
    fn test_display_missing_column() {
        let err = ReconstructError::MissingColumn("polarity");
        assert_eq!(
            err.to_string(),
            "missing required column 'polarity' in event header"
        );
    }

    #[test]
    fn test_display_coordinate_out_of_range() {
        let err = ReconstructError::CoordinateOutOfRange {
            x: 128,
            y: 3,
            width: 128,
            height: 128,
        };
        assert_eq!(
            err.to_string(),
            "event at (128, 3) is outside the 128x128 sensor"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error;

        let err = ReconstructError::io(
            "/tmp/events.csv",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().contains("/tmp/events.csv"));
        assert!(err.source().is_some());
    }
}
