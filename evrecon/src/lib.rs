//! evrecon - intensity-image reconstruction from event cameras.
//!
//! An event camera reports per-pixel brightness changes (timestamp, pixel,
//! polarity) instead of frames. This library turns a time-sorted event log
//! into a sequence of grayscale frames, one per fixed time window.
//!
//! # Architecture
//!
//! ```text
//!  events.csv ─► EventReader ─► FrameScheduler ─┬─► EventAccumulator ─┐
//!                                               │                     ▼
//!                                               │        StateStore (3 grids)
//!                                               │                     ▲
//!                                               ├─► ManifoldTvSolver ─┘
//!                                               │
//!                                               └─► FrameExporter ─► <t>.png
//! ```
//!
//! - [`state::StateStore`] owns the intensity field, the pending evidence and
//!   the last-update timestamp map.
//! - [`accumulator::EventAccumulator`] folds one window of events into the
//!   pending evidence.
//! - [`solver::ManifoldTvSolver`] regularizes the per-window change of the
//!   field with a timestamp-weighted TV prior.
//! - [`scheduler::FrameScheduler`] decides when a window closes and drives the
//!   other components.
//! - [`Reconstructor`] ties everything to a [`ReconstructionConfig`].

pub mod accumulator;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod grid;
pub mod input;
pub mod reconstructor;
pub mod scheduler;
pub mod solver;
pub mod state;

pub use config::{AccumulatorConfig, ReconstructionConfig, SolverConfig};
pub use error::{ReconstructError, ReconstructResult};
pub use event::{Event, Polarity};
pub use export::{FrameExporter, IntensityMapping, PngFrameExporter};
pub use grid::{Dimensions, Grid};
pub use reconstructor::{ReconstructionSummary, Reconstructor};
pub use solver::EnergyModel;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
