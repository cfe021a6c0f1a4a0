//! Reconstruction configuration.
//!
//! All tunables live here with their defaults. The intensity bounds, contrast
//! thresholds, drift weight and iteration count keep the values the
//! reconstruction was originally tuned with; the remaining constants belong to
//! this implementation's discretization and are documented where they are
//! used.
//!
//! Timestamps are raw integers in the same unit as the frame interval
//! (milliseconds by default). [`DEFAULT_TIME_CONSTANT`] converts them to
//! seconds for the time-dependent terms.

use crate::error::{ReconstructError, ReconstructResult};
use crate::grid::Dimensions;
use crate::solver::EnergyModel;

// ==================== Sensor & Scheduling ====================

/// Default sensor width in pixels.
pub const DEFAULT_WIDTH: u16 = 128;

/// Default sensor height in pixels.
pub const DEFAULT_HEIGHT: u16 = 128;

/// Default frame interval, in timestamp units (milliseconds).
pub const DEFAULT_FRAME_INTERVAL: u64 = 1000;

/// Seconds per raw timestamp unit.
pub const DEFAULT_TIME_CONSTANT: f64 = 1e-3;

// ==================== Intensity Field ====================

/// Initial log-intensity of every pixel.
pub const DEFAULT_U0: f32 = 1.5;

/// Lower bound of the log-intensity field.
pub const DEFAULT_U_MIN: f32 = 1.0;

/// Upper bound of the log-intensity field.
pub const DEFAULT_U_MAX: f32 = 2.0;

// ==================== Accumulator ====================

/// Contrast threshold of a positive event (linear ratio).
///
/// A positive event contributes `ln(C1)` of log-intensity evidence.
pub const DEFAULT_C1: f32 = 1.15;

/// Contrast threshold of a negative event (linear ratio).
///
/// A negative event contributes `-ln(C2)` of log-intensity evidence.
pub const DEFAULT_C2: f32 = 1.25;

/// Time constant of the evidence decay between events at one pixel, in
/// seconds.
pub const DEFAULT_EVIDENCE_DECAY_SECS: f64 = 0.5;

// ==================== Solver ====================

/// Weight of the manifold TV term.
///
/// With [`DEFAULT_MANIFOLD_TIME_SCALE`], an isolated event 100 ms before the
/// window end loses about a third of its brightening against a neighbourhood
/// idle for a second. The centre of a 4×4 patch of such events loses under a
/// tenth.
pub const DEFAULT_LAMBDA: f32 = 0.05;

/// Weight of the temporal drift term.
pub const DEFAULT_LAMBDA_T: f32 = 2.0;

/// Primal-dual iterations per frame.
pub const DEFAULT_ITERATIONS: usize = 50;

/// Timestamp gap, in seconds, at which an edge's smoothing weight drops to
/// `1/√2`.
///
/// Gaps of about one frame interval still couple neighbours with half
/// weight, so fresh events are smoothed against stale surroundings.
pub const DEFAULT_MANIFOLD_TIME_SCALE: f64 = 0.5;

/// Configuration for folding events into the pending accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorConfig {
    /// Positive contrast threshold (> 1).
    pub c1: f32,

    /// Negative contrast threshold (> 1).
    pub c2: f32,

    /// Decay time constant for evidence at a pixel, in seconds.
    pub evidence_decay_secs: f64,

    /// Seconds per raw timestamp unit.
    pub time_constant: f64,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            c1: DEFAULT_C1,
            c2: DEFAULT_C2,
            evidence_decay_secs: DEFAULT_EVIDENCE_DECAY_SECS,
            time_constant: DEFAULT_TIME_CONSTANT,
        }
    }
}

impl AccumulatorConfig {
    /// Set both contrast thresholds.
    pub fn with_thresholds(mut self, c1: f32, c2: f32) -> Self {
        self.c1 = c1;
        self.c2 = c2;
        self
    }

    /// Check that all constants are usable.
    pub fn validate(&self) -> ReconstructResult<()> {
        if !(self.c1 > 1.0 && self.c1.is_finite()) || !(self.c2 > 1.0 && self.c2.is_finite()) {
            return Err(ReconstructError::InvalidConfig(format!(
                "contrast thresholds must be finite and > 1 (c1 = {}, c2 = {})",
                self.c1, self.c2
            )));
        }
        if !(self.evidence_decay_secs > 0.0) {
            return Err(ReconstructError::InvalidConfig(format!(
                "evidence decay must be positive, got {}",
                self.evidence_decay_secs
            )));
        }
        if !(self.time_constant > 0.0) {
            return Err(ReconstructError::InvalidConfig(format!(
                "time constant must be positive, got {}",
                self.time_constant
            )));
        }
        Ok(())
    }
}

/// Configuration for the manifold TV solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Weight of the spatial TV term.
    pub lambda: f32,

    /// Weight of the temporal drift term.
    pub lambda_t: f32,

    /// Fixed number of iterations per solve.
    pub iterations: usize,

    /// Lower bound of the intensity field.
    pub u_min: f32,

    /// Upper bound of the intensity field.
    pub u_max: f32,

    /// Data-term variant.
    pub energy: EnergyModel,

    /// Seconds per raw timestamp unit.
    pub time_constant: f64,

    /// Timestamp gap scale for edge weights, in seconds.
    pub manifold_time_scale: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            lambda: DEFAULT_LAMBDA,
            lambda_t: DEFAULT_LAMBDA_T,
            iterations: DEFAULT_ITERATIONS,
            u_min: DEFAULT_U_MIN,
            u_max: DEFAULT_U_MAX,
            energy: EnergyModel::default(),
            time_constant: DEFAULT_TIME_CONSTANT,
            manifold_time_scale: DEFAULT_MANIFOLD_TIME_SCALE,
        }
    }
}

impl SolverConfig {
    /// Set the spatial and temporal weights.
    pub fn with_weights(mut self, lambda: f32, lambda_t: f32) -> Self {
        self.lambda = lambda;
        self.lambda_t = lambda_t;
        self
    }

    /// Set the iteration count.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the energy variant.
    pub fn with_energy(mut self, energy: EnergyModel) -> Self {
        self.energy = energy;
        self
    }

    /// Check that all constants are usable.
    pub fn validate(&self) -> ReconstructResult<()> {
        if !(self.u_min.is_finite() && self.u_max.is_finite() && self.u_min < self.u_max) {
            return Err(ReconstructError::InvalidConfig(format!(
                "intensity bounds must satisfy u_min < u_max (got [{}, {}])",
                self.u_min, self.u_max
            )));
        }
        if !(self.lambda >= 0.0 && self.lambda.is_finite()) {
            return Err(ReconstructError::InvalidConfig(format!(
                "lambda must be finite and non-negative, got {}",
                self.lambda
            )));
        }
        if !(self.lambda_t >= 0.0 && self.lambda_t.is_finite()) {
            return Err(ReconstructError::InvalidConfig(format!(
                "lambda_t must be finite and non-negative, got {}",
                self.lambda_t
            )));
        }
        if !(self.time_constant > 0.0) || !(self.manifold_time_scale > 0.0) {
            return Err(ReconstructError::InvalidConfig(
                "time constant and manifold time scale must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration for one reconstruction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionConfig {
    /// Sensor dimensions; every grid has this size.
    pub dimensions: Dimensions,

    /// Window length in timestamp units.
    pub frame_interval: u64,

    /// Initial value of the intensity field.
    pub u0: f32,

    /// Event accumulation settings.
    pub accumulator: AccumulatorConfig,

    /// Solver settings.
    pub solver: SolverConfig,

    /// Worker threads for per-pixel work. `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            dimensions: Dimensions::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            u0: DEFAULT_U0,
            accumulator: AccumulatorConfig::default(),
            solver: SolverConfig::default(),
            threads: None,
        }
    }
}

impl ReconstructionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sensor dimensions.
    pub fn with_dimensions(mut self, width: u16, height: u16) -> Self {
        self.dimensions = Dimensions::new(width, height);
        self
    }

    /// Set the frame interval.
    pub fn with_frame_interval(mut self, frame_interval: u64) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    /// Set the accumulator configuration.
    pub fn with_accumulator(mut self, accumulator: AccumulatorConfig) -> Self {
        self.accumulator = accumulator;
        self
    }

    /// Set the solver configuration.
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Set the seconds-per-unit conversion for both accumulator and solver.
    pub fn with_time_constant(mut self, time_constant: f64) -> Self {
        self.accumulator.time_constant = time_constant;
        self.solver.time_constant = time_constant;
        self
    }

    /// Use a dedicated pool with `threads` workers.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Check the whole configuration.
    pub fn validate(&self) -> ReconstructResult<()> {
        if self.dimensions.is_empty() {
            return Err(ReconstructError::InvalidConfig(format!(
                "sensor dimensions must be non-zero (got {}x{})",
                self.dimensions.width, self.dimensions.height
            )));
        }
        if self.frame_interval == 0 {
            return Err(ReconstructError::InvalidConfig(
                "frame interval must be positive".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(ReconstructError::InvalidConfig(
                "thread count must be positive".to_string(),
            ));
        }
        self.accumulator.validate()?;
        self.solver.validate()?;
        if !(self.solver.u_min..=self.solver.u_max).contains(&self.u0) {
            return Err(ReconstructError::InvalidConfig(format!(
                "u0 = {} lies outside [{}, {}]",
                self.u0, self.solver.u_min, self.solver.u_max
            )));
        }
        Ok(())
    }
}
