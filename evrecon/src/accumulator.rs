//! Folding a window of events into pending evidence.
//!
//! Each event adds one contrast step of log-intensity evidence at its pixel:
//! `+ln(C1)` for a positive event and `-ln(C2)` for a negative one. Evidence
//! already present at the pixel decays with the time elapsed since that
//! pixel's previous event:
//!
//! ```text
//! A ← A · exp(-Δt / decay) + step
//! ```
//!
//! The decay makes the update order-dependent, so events are applied
//! sequentially in arrival order.

use std::collections::HashSet;

use tracing::debug;

use crate::config::AccumulatorConfig;
use crate::error::{ReconstructError, ReconstructResult};
use crate::event::{Event, Polarity};
use crate::state::StateStore;

/// Summary of one accumulation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulateStats {
    /// Events folded in.
    pub events: usize,
    /// Positive events.
    pub positive: usize,
    /// Negative events.
    pub negative: usize,
    /// Distinct pixels touched.
    pub touched_pixels: usize,
}

/// Folds event batches into the pending accumulator and timestamp map.
#[derive(Debug, Clone)]
pub struct EventAccumulator {
    config: AccumulatorConfig,
    positive_step: f32,
    negative_step: f32,
}

impl EventAccumulator {
    /// Create an accumulator from validated configuration.
    pub fn new(config: AccumulatorConfig) -> Self {
        let positive_step = config.c1.ln();
        let negative_step = -config.c2.ln();
        Self {
            config,
            positive_step,
            negative_step,
        }
    }

    /// Log-intensity evidence contributed by one event of `polarity`.
    pub fn step(&self, polarity: Polarity) -> f32 {
        match polarity {
            Polarity::Positive => self.positive_step,
            Polarity::Negative => self.negative_step,
        }
    }

    /// Replace the pending evidence with the contribution of `events`.
    ///
    /// The accumulator is cleared first; the timestamp map carries over
    /// between windows.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructError::CoordinateOutOfRange`] if any event lies
    /// outside the grid. The state is left untouched in that case.
    pub fn accumulate(
        &self,
        state: &mut StateStore,
        events: &[Event],
    ) -> ReconstructResult<AccumulateStats> {
        let dimensions = state.dimensions();
        if let Some(bad) = events
            .iter()
            .find(|e| !dimensions.contains(e.x(), e.y()))
        {
            return Err(ReconstructError::CoordinateOutOfRange {
                x: i64::from(bad.x()),
                y: i64::from(bad.y()),
                width: dimensions.width,
                height: dimensions.height,
            });
        }

        let (pending, last_update) = state.accumulate_view();
        pending.fill(0.0);

        let mut stats = AccumulateStats::default();
        let mut touched = HashSet::new();

        for event in events {
            let idx = pending.index(event.x() as usize, event.y() as usize);
            let previous = last_update.as_slice()[idx];
            let elapsed =
                event.timestamp().saturating_sub(previous) as f64 * self.config.time_constant;
            let decay = (-elapsed / self.config.evidence_decay_secs).exp() as f32;

            let value = &mut pending.as_mut_slice()[idx];
            *value = *value * decay + self.step(event.polarity());
            last_update.as_mut_slice()[idx] = event.timestamp();

            match event.polarity() {
                Polarity::Positive => stats.positive += 1,
                Polarity::Negative => stats.negative += 1,
            }
            touched.insert(idx);
        }

        stats.events = events.len();
        stats.touched_pixels = touched.len();

        debug!(
            events = stats.events,
            positive = stats.positive,
            negative = stats.negative,
            touched_pixels = stats.touched_pixels,
            "Accumulated window events"
        );

        Ok(stats)
    }
}
