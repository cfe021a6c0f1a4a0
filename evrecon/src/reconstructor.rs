//! End-to-end reconstruction runs.
//!
//! [`Reconstructor`] wires a validated [`ReconstructionConfig`] into the
//! pipeline: it allocates the engine state, builds the accumulator, solver
//! and scheduler, feeds the events through and reports what happened.
//!
//! ```no_run
//! use std::path::Path;
//! use evrecon::{ReconstructionConfig, Reconstructor};
//!
//! let config = ReconstructionConfig::new().with_dimensions(240, 180);
//! let reconstructor = Reconstructor::new(config)?;
//! let summary = reconstructor.run_file(Path::new("events.csv"), Path::new("frames"))?;
//! println!("{} frames written", summary.frames.len());
//! # Ok::<(), evrecon::ReconstructError>(())
//! ```

use std::fs;
use std::path::Path;

use rayon::ThreadPool;
use tracing::{info, warn};

use crate::accumulator::EventAccumulator;
use crate::config::ReconstructionConfig;
use crate::error::{ReconstructError, ReconstructResult};
use crate::event::Event;
use crate::export::{FrameExporter, IntensityMapping, PngFrameExporter};
use crate::input::EventReader;
use crate::scheduler::{FrameReport, FrameScheduler};
use crate::solver::ManifoldTvSolver;
use crate::state::StateStore;

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconstructionSummary {
    /// Events fed into the scheduler.
    pub events_read: usize,
    /// One report per exported frame, in order.
    pub frames: Vec<FrameReport>,
    /// Events left in the final, unflushed window.
    pub dropped_events: usize,
}

/// Runs the reconstruction pipeline for one configuration.
pub struct Reconstructor {
    config: ReconstructionConfig,
    pool: Option<ThreadPool>,
}

impl Reconstructor {
    /// Validate `config` and prepare the worker pool.
    pub fn new(config: ReconstructionConfig) -> ReconstructResult<Self> {
        config.validate()?;

        let pool = match config.threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("evrecon-pixel-{}", i))
                    .build()
                    .map_err(|e| ReconstructError::InvalidConfig(e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self { config, pool })
    }

    /// Read an event log and write PNG frames into `out_dir`.
    ///
    /// The output directory is created if it does not exist.
    pub fn run_file(
        &self,
        events_path: &Path,
        out_dir: &Path,
    ) -> ReconstructResult<ReconstructionSummary> {
        let events = EventReader::new(self.config.dimensions).read_path(events_path)?;
        fs::create_dir_all(out_dir).map_err(|e| ReconstructError::io(out_dir, e))?;

        let mapping = IntensityMapping::new(self.config.solver.u_min, self.config.solver.u_max);
        let exporter = PngFrameExporter::new(out_dir, mapping);
        self.run(&events, Box::new(exporter))
    }

    /// Reconstruct `events` in order, exporting through `exporter`.
    pub fn run(
        &self,
        events: &[Event],
        exporter: Box<dyn FrameExporter>,
    ) -> ReconstructResult<ReconstructionSummary> {
        match &self.pool {
            Some(pool) => pool.install(|| self.run_pipeline(events, exporter)),
            None => self.run_pipeline(events, exporter),
        }
    }

    fn run_pipeline(
        &self,
        events: &[Event],
        exporter: Box<dyn FrameExporter>,
    ) -> ReconstructResult<ReconstructionSummary> {
        let config = &self.config;
        let dimensions = config.dimensions;

        info!(
            width = dimensions.width,
            height = dimensions.height,
            frame_interval = config.frame_interval,
            iterations = config.solver.iterations,
            energy = %config.solver.energy,
            exporter = exporter.name(),
            events = events.len(),
            "Starting reconstruction"
        );

        if events.is_empty() {
            warn!("Event log is empty; no frames will be produced");
            return Ok(ReconstructionSummary::default());
        }

        let mut scheduler = FrameScheduler::new(
            config.frame_interval,
            StateStore::new(dimensions, config.u0),
            EventAccumulator::new(config.accumulator.clone()),
            ManifoldTvSolver::new(dimensions, config.solver.clone()),
            exporter,
        )?;

        let frames = scheduler.ingest_all(events.iter().copied())?;
        let dropped_events = scheduler.finish();

        info!(
            frames = frames.len(),
            dropped_events, "Reconstruction complete"
        );

        Ok(ReconstructionSummary {
            events_read: events.len(),
            frames,
            dropped_events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Polarity;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ReconstructionConfig::new().with_frame_interval(0);
        assert!(matches!(
            Reconstructor::new(config),
            Err(ReconstructError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_event_log_produces_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let reconstructor = Reconstructor::new(ReconstructionConfig::new()).unwrap();
        let exporter = PngFrameExporter::new(dir.path(), IntensityMapping::new(1.0, 2.0));

        let summary = reconstructor.run(&[], Box::new(exporter)).unwrap();
        assert_eq!(summary, ReconstructionSummary::default());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_dedicated_pool_runs_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReconstructionConfig::new()
            .with_dimensions(16, 16)
            .with_threads(2);
        let reconstructor = Reconstructor::new(config).unwrap();
        let exporter = PngFrameExporter::new(dir.path(), IntensityMapping::new(1.0, 2.0));

        let events = [
            Event::new(10, 1, 1, Polarity::Positive),
            Event::new(1200, 2, 2, Polarity::Negative),
        ];
        let summary = reconstructor.run(&events, Box::new(exporter)).unwrap();

        assert_eq!(summary.events_read, 2);
        assert_eq!(summary.frames.len(), 1);
        assert_eq!(summary.dropped_events, 1);
        assert!(dir.path().join("1000.png").exists());
    }

    #[test]
    fn test_run_file_creates_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let events_path = dir.path().join("events.csv");
        fs::write(&events_path, "timestamp,x,y,polarity\n0,1,1,1\n1001,1,1,0\n").unwrap();
        let out_dir = dir.path().join("nested").join("frames");

        let config = ReconstructionConfig::new().with_dimensions(8, 8);
        let summary = Reconstructor::new(config)
            .unwrap()
            .run_file(&events_path, &out_dir)
            .unwrap();

        assert_eq!(summary.frames.len(), 1);
        assert!(out_dir.join("1000.png").exists());
    }
}
