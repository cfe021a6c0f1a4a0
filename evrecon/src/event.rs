//! Normalized event-camera measurements.
//!
//! An [`Event`] is built once at ingestion and never changes afterwards.
//! Ingestion mirrors the row coordinate (`y = height - 1 - y_raw`) so that
//! frames come out in the orientation the sensor reports them, and folds
//! any raw polarity into one of the two [`Polarity`] values.

use std::fmt;

use crate::error::{ReconstructError, ReconstructResult};
use crate::grid::Dimensions;

/// Sign of a brightness change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// Brightness increased (+1).
    Positive,
    /// Brightness decreased (-1).
    Negative,
}

impl Polarity {
    /// Fold a raw signed polarity into `Positive` (> 0) or `Negative`.
    ///
    /// Sensors and converters disagree on encoding (`0/1`, `-1/+1`), so
    /// anything that is not strictly positive counts as a decrease.
    pub fn from_raw(raw: i64) -> Self {
        if raw > 0 {
            Polarity::Positive
        } else {
            Polarity::Negative
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Positive => write!(f, "+1"),
            Polarity::Negative => write!(f, "-1"),
        }
    }
}

/// A single normalized brightness-change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    timestamp: u64,
    x: u16,
    y: u16,
    polarity: Polarity,
}

impl Event {
    /// Create an event from already-normalized grid coordinates.
    pub fn new(timestamp: u64, x: u16, y: u16, polarity: Polarity) -> Self {
        Self {
            timestamp,
            x,
            y,
            polarity,
        }
    }

    /// Normalize a raw sensor record.
    ///
    /// Mirrors `y_raw` about the horizontal axis and maps the polarity to
    /// ±1.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructError::CoordinateOutOfRange`] if the raw
    /// coordinates fall outside `dimensions`.
    pub fn from_raw(
        timestamp: u64,
        x_raw: i64,
        y_raw: i64,
        polarity_raw: i64,
        dimensions: Dimensions,
    ) -> ReconstructResult<Self> {
        let width = i64::from(dimensions.width);
        let height = i64::from(dimensions.height);

        if !(0..width).contains(&x_raw) || !(0..height).contains(&y_raw) {
            return Err(ReconstructError::CoordinateOutOfRange {
                x: x_raw,
                y: y_raw,
                width: dimensions.width,
                height: dimensions.height,
            });
        }

        Ok(Self {
            timestamp,
            x: x_raw as u16,
            y: (height - 1 - y_raw) as u16,
            polarity: Polarity::from_raw(polarity_raw),
        })
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn x(&self) -> u16 {
        self.x
    }

    pub fn y(&self) -> u16 {
        self.y
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }
}
