//! Window scheduling.
//!
//! The [`FrameScheduler`] cuts the chronological event stream into windows of
//! `frame_interval` and drives one reconstruction cycle per window boundary:
//!
//! ```text
//!  ingest(e) ──► e.t <= window_end ? ──yes──► buffer.push(e)
//!                     │
//!                     no (flush)
//!                     ▼
//!  accumulate(buffer) ─► solve(window_end) ─► export(window_end)
//!                     │
//!                     ▼
//!  buffer.clear(); window_end += frame_interval; buffer.push(e)
//! ```
//!
//! The window end advances by exactly one interval per flush, even when the
//! triggering event lies several windows ahead. Empty windows therefore never
//! produce a frame, and the frame named `window_end` may hold events from a
//! later time span after a gap. Events still buffered when the stream ends
//! are dropped without a frame.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::accumulator::EventAccumulator;
use crate::error::{ReconstructError, ReconstructResult};
use crate::event::Event;
use crate::export::FrameExporter;
use crate::solver::ManifoldTvSolver;
use crate::state::StateStore;

/// Where the scheduler is in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No event seen yet.
    Idle,
    /// Buffering events up to and including `window_end`.
    Accumulating { window_end: u64 },
}

/// Description of one emitted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Timestamp the frame is named after.
    pub window_end: u64,
    /// Events folded into this frame.
    pub event_count: usize,
    /// Location reported by the exporter.
    pub path: PathBuf,
}

/// End of the first window containing `timestamp`.
pub fn first_window_end(timestamp: u64, frame_interval: u64) -> u64 {
    (timestamp - timestamp % frame_interval).saturating_add(frame_interval)
}

/// Drives accumulate → solve → export at each window boundary.
pub struct FrameScheduler {
    frame_interval: u64,
    state: SchedulerState,
    buffer: Vec<Event>,
    store: StateStore,
    accumulator: EventAccumulator,
    solver: ManifoldTvSolver,
    exporter: Box<dyn FrameExporter>,
    frames_emitted: usize,
}

impl FrameScheduler {
    /// Create a scheduler over freshly allocated state.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructError::InvalidConfig`] if `frame_interval` is 0.
    pub fn new(
        frame_interval: u64,
        store: StateStore,
        accumulator: EventAccumulator,
        solver: ManifoldTvSolver,
        exporter: Box<dyn FrameExporter>,
    ) -> ReconstructResult<Self> {
        if frame_interval == 0 {
            return Err(ReconstructError::InvalidConfig(
                "frame interval must be positive".to_string(),
            ));
        }
        Ok(Self {
            frame_interval,
            state: SchedulerState::Idle,
            buffer: Vec::new(),
            store,
            accumulator,
            solver,
            exporter,
            frames_emitted: 0,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Events waiting for the next boundary.
    pub fn buffered(&self) -> &[Event] {
        &self.buffer
    }

    pub fn frames_emitted(&self) -> usize {
        self.frames_emitted
    }

    /// Feed the next event of the stream.
    ///
    /// Returns a report when this event closed a window and a frame was
    /// exported.
    pub fn ingest(&mut self, event: Event) -> ReconstructResult<Option<FrameReport>> {
        let window_end = match self.state {
            SchedulerState::Idle => {
                let end = first_window_end(event.timestamp(), self.frame_interval);
                debug!(first_timestamp = event.timestamp(), window_end = end, "First window");
                self.state = SchedulerState::Accumulating { window_end: end };
                end
            }
            SchedulerState::Accumulating { window_end } => window_end,
        };

        if event.timestamp() <= window_end {
            self.buffer.push(event);
            return Ok(None);
        }

        let report = self.flush(window_end)?;

        let next_end = window_end.saturating_add(self.frame_interval);
        if event.timestamp() > next_end {
            let behind = (event.timestamp() - next_end).div_ceil(self.frame_interval);
            debug!(
                timestamp = event.timestamp(),
                window_end = next_end,
                windows_behind = behind,
                "Event gap spans several windows; no frames emitted for the gap"
            );
        }

        self.state = SchedulerState::Accumulating {
            window_end: next_end,
        };
        self.buffer.push(event);

        Ok(Some(report))
    }

    /// Feed a whole stream, collecting the frame reports.
    pub fn ingest_all<I>(&mut self, events: I) -> ReconstructResult<Vec<FrameReport>>
    where
        I: IntoIterator<Item = Event>,
    {
        let mut reports = Vec::new();
        for event in events {
            if let Some(report) = self.ingest(event)? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    /// End the stream.
    ///
    /// The final partial window is not reconstructed. Returns the number of
    /// buffered events that were dropped.
    pub fn finish(&mut self) -> usize {
        let dropped = self.buffer.len();
        if dropped > 0 {
            let window_end = match self.state {
                SchedulerState::Accumulating { window_end } => window_end,
                SchedulerState::Idle => 0,
            };
            warn!(
                dropped,
                window_end, "Stream ended inside a window; trailing events produce no frame"
            );
        }
        self.buffer.clear();
        dropped
    }

    fn flush(&mut self, window_end: u64) -> ReconstructResult<FrameReport> {
        let stats = self.accumulator.accumulate(&mut self.store, &self.buffer)?;
        self.solver.solve(&mut self.store, window_end);
        let path = self.exporter.export(self.store.intensity(), window_end)?;

        self.frames_emitted += 1;
        info!(
            window_end,
            events = stats.events,
            path = %path.display(),
            "Frame exported"
        );

        let report = FrameReport {
            window_end,
            event_count: self.buffer.len(),
            path,
        };
        self.buffer.clear();
        Ok(report)
    }
}
