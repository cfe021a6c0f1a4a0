//! Engine-owned per-pixel state.
//!
//! [`StateStore`] holds the three grids the reconstruction works on. They are
//! allocated once with identical dimensions and live until the engine is
//! dropped:
//!
//! | grid          | type         | written by        | read by                 |
//! |---------------|--------------|-------------------|-------------------------|
//! | `intensity`   | `Grid<f32>`  | solver            | exporter, solver        |
//! | `pending`     | `Grid<f32>`  | accumulator       | solver                  |
//! | `last_update` | `Grid<u64>`  | accumulator       | accumulator, solver     |

use crate::grid::{Dimensions, Grid};

/// The three grids of the reconstruction engine.
#[derive(Debug, Clone)]
pub struct StateStore {
    dimensions: Dimensions,
    intensity: Grid<f32>,
    pending: Grid<f32>,
    last_update: Grid<u64>,
}

impl StateStore {
    /// Allocate state with the intensity field filled with `u0`.
    ///
    /// The accumulator and timestamp map start at zero.
    pub fn new(dimensions: Dimensions, u0: f32) -> Self {
        Self {
            dimensions,
            intensity: Grid::new(dimensions, u0),
            pending: Grid::new(dimensions, 0.0),
            last_update: Grid::new(dimensions, 0),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Current log-intensity estimate.
    pub fn intensity(&self) -> &Grid<f32> {
        &self.intensity
    }

    /// Evidence accumulated for the window being processed.
    pub fn pending(&self) -> &Grid<f32> {
        &self.pending
    }

    /// Timestamp of the most recent event at each pixel.
    pub fn last_update(&self) -> &Grid<u64> {
        &self.last_update
    }

    /// Borrow the grids the accumulator writes.
    pub(crate) fn accumulate_view(&mut self) -> (&mut Grid<f32>, &mut Grid<u64>) {
        (&mut self.pending, &mut self.last_update)
    }

    /// Borrow the field mutably alongside the read-only solver inputs.
    pub(crate) fn solve_view(&mut self) -> (&mut Grid<f32>, &Grid<f32>, &Grid<u64>) {
        (&mut self.intensity, &self.pending, &self.last_update)
    }
}

#[cfg(test)]
impl StateStore {
    pub(crate) fn intensity_mut(&mut self) -> &mut Grid<f32> {
        &mut self.intensity
    }

    pub(crate) fn pending_mut(&mut self) -> &mut Grid<f32> {
        &mut self.pending
    }

    pub(crate) fn last_update_mut(&mut self) -> &mut Grid<u64> {
        &mut self.last_update
    }
}
