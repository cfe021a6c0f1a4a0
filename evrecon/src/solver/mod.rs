//! Manifold total-variation solver.
//!
//! Each window, the solver estimates the per-pixel log-intensity change
//! `d = u - u_prev` that best explains the pending evidence `a` while staying
//! piecewise smooth on the event manifold:
//!
//! ```text
//! E(d) = lambda · Σ ‖W ∇d‖  +  Σ D(d - a)  +  lambda_t · Σ m · d²
//! ```
//!
//! `W` holds the timestamp-derived edge weights (see [`metric`]), `D` is the
//! data term selected by [`EnergyModel`], and `m` is the time since each
//! pixel's last update.
//!
//! # Algorithm
//!
//! A fixed number of Chambolle–Pock primal–dual iterations, started from
//! `d = 0` (the previous frame) with `σ = τ = 1/√8`:
//!
//! ```text
//! p  ← proj_{‖p‖ ≤ lambda}(p + σ W∇d̄)          dual, per pixel
//! d' ← prox_τG(d + τ div(W p))                  primal, per pixel
//! u  ← clamp(u_prev + d', u_min, u_max)
//! d̄  ← 2d' - d
//! ```
//!
//! Every pixel update reads only the previous iterate, so each pass is an
//! independent parallel-for over rows and the result does not depend on the
//! thread count. There is no convergence test and no failure signal; the clamp
//! bounds any divergence caused by badly tuned weights.

mod energy;
pub mod metric;

pub use energy::EnergyModel;

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::SolverConfig;
use crate::grid::Dimensions;
use crate::state::StateStore;

/// Primal and dual step size, `1/√8` (the squared norm of the forward
/// difference operator is at most 8 and the edge weights are at most 1).
const STEP: f32 = 0.353_553_38;

/// Outcome of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveStats {
    /// Iterations performed.
    pub iterations: usize,
    /// Largest absolute change of any pixel.
    pub max_change: f32,
    /// Wall-clock duration.
    pub elapsed: Duration,
}

/// Working buffers, allocated once per solver.
#[derive(Debug)]
struct Scratch {
    previous: Vec<f32>,
    increment: Vec<f32>,
    relaxed: Vec<f32>,
    dual_x: Vec<f32>,
    dual_y: Vec<f32>,
    weight_x: Vec<f32>,
    weight_y: Vec<f32>,
    drift: Vec<f32>,
}

impl Scratch {
    fn new(len: usize) -> Self {
        Self {
            previous: vec![0.0; len],
            increment: vec![0.0; len],
            relaxed: vec![0.0; len],
            dual_x: vec![0.0; len],
            dual_y: vec![0.0; len],
            weight_x: vec![0.0; len],
            weight_y: vec![0.0; len],
            drift: vec![0.0; len],
        }
    }
}

/// Iterative manifold TV solver over the intensity field.
#[derive(Debug)]
pub struct ManifoldTvSolver {
    config: SolverConfig,
    dimensions: Dimensions,
    scratch: Scratch,
}

impl ManifoldTvSolver {
    /// Create a solver for grids of `dimensions`.
    pub fn new(dimensions: Dimensions, config: SolverConfig) -> Self {
        Self {
            config,
            dimensions,
            scratch: Scratch::new(dimensions.pixel_count()),
        }
    }

    /// Update the intensity field in place for the window ending at
    /// `window_end`.
    ///
    /// # Panics
    ///
    /// Panics if `state` was allocated with different dimensions than the
    /// solver.
    pub fn solve(&mut self, state: &mut StateStore, window_end: u64) -> SolveStats {
        assert_eq!(
            state.dimensions(),
            self.dimensions,
            "solver and state dimensions differ"
        );

        let started = Instant::now();
        let width = self.dimensions.width as usize;
        let height = self.dimensions.height as usize;
        let config = &self.config;
        let s = &mut self.scratch;

        trace!(
            window_end,
            lambda = config.lambda,
            lambda_t = config.lambda_t,
            iterations = config.iterations,
            energy = %config.energy,
            "Starting manifold TV solve"
        );

        let (field, pending, last_update) = state.solve_view();

        s.previous.copy_from_slice(field.as_slice());
        s.increment.fill(0.0);
        s.relaxed.fill(0.0);
        s.dual_x.fill(0.0);
        s.dual_y.fill(0.0);

        metric::fill_edge_weights(
            last_update.as_slice(),
            width,
            height,
            config.time_constant,
            config.manifold_time_scale,
            &mut s.weight_x,
            &mut s.weight_y,
        );
        s.drift
            .par_iter_mut()
            .zip(last_update.as_slice().par_iter())
            .for_each(|(drift, &t)| {
                *drift =
                    metric::drift_weight(config.lambda_t, window_end, t, config.time_constant);
            });

        let evidence = pending.as_slice();
        let field = field.as_mut_slice();

        for _ in 0..config.iterations {
            dual_step(
                &s.relaxed,
                &s.weight_x,
                &s.weight_y,
                &mut s.dual_x,
                &mut s.dual_y,
                width,
                config.lambda,
            );

            let primal = PrimalInputs {
                dual_x: &s.dual_x,
                dual_y: &s.dual_y,
                weight_x: &s.weight_x,
                weight_y: &s.weight_y,
                previous: &s.previous,
                evidence,
                drift: &s.drift,
                width,
                config,
            };
            primal_step(&primal, &mut s.increment, &mut s.relaxed, field);
        }

        let max_change = s.increment.iter().fold(0.0f32, |acc, d| acc.max(d.abs()));
        let stats = SolveStats {
            iterations: config.iterations,
            max_change,
            elapsed: started.elapsed(),
        };

        debug!(
            window_end,
            iterations = stats.iterations,
            max_change = stats.max_change,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Solved frame"
        );

        stats
    }
}

/// Dual ascent on `p` followed by projection onto the `lambda` ball.
fn dual_step(
    relaxed: &[f32],
    weight_x: &[f32],
    weight_y: &[f32],
    dual_x: &mut [f32],
    dual_y: &mut [f32],
    width: usize,
    lambda: f32,
) {
    let height = relaxed.len() / width;

    dual_x
        .par_chunks_mut(width)
        .zip(dual_y.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (px_row, py_row))| {
            let base = y * width;
            for x in 0..width {
                let i = base + x;
                let here = relaxed[i];
                let gx = if x + 1 < width {
                    weight_x[i] * (relaxed[i + 1] - here)
                } else {
                    0.0
                };
                let gy = if y + 1 < height {
                    weight_y[i] * (relaxed[i + width] - here)
                } else {
                    0.0
                };

                let px = px_row[x] + STEP * gx;
                let py = py_row[x] + STEP * gy;
                if lambda <= 0.0 {
                    px_row[x] = 0.0;
                    py_row[x] = 0.0;
                    continue;
                }
                let scale = ((px * px + py * py).sqrt() / lambda).max(1.0);
                px_row[x] = px / scale;
                py_row[x] = py / scale;
            }
        });
}

/// Read-only inputs of the primal step.
struct PrimalInputs<'a> {
    dual_x: &'a [f32],
    dual_y: &'a [f32],
    weight_x: &'a [f32],
    weight_y: &'a [f32],
    previous: &'a [f32],
    evidence: &'a [f32],
    drift: &'a [f32],
    width: usize,
    config: &'a SolverConfig,
}

impl PrimalInputs<'_> {
    /// Weighted divergence of the dual field at `(x, y)`.
    #[inline]
    fn divergence(&self, x: usize, y: usize) -> f32 {
        let i = y * self.width + x;
        let mut div = self.weight_x[i] * self.dual_x[i] + self.weight_y[i] * self.dual_y[i];
        if x > 0 {
            div -= self.weight_x[i - 1] * self.dual_x[i - 1];
        }
        if y > 0 {
            div -= self.weight_y[i - self.width] * self.dual_y[i - self.width];
        }
        div
    }
}

/// Proximal step on the increment, clamping, and over-relaxation.
fn primal_step(
    inputs: &PrimalInputs<'_>,
    increment: &mut [f32],
    relaxed: &mut [f32],
    field: &mut [f32],
) {
    let width = inputs.width;
    let config = inputs.config;

    increment
        .par_chunks_mut(width)
        .zip(relaxed.par_chunks_mut(width))
        .zip(field.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, ((d_row, bar_row), u_row))| {
            let base = y * width;
            for x in 0..width {
                let i = base + x;
                let old = d_row[x];
                let v = old + STEP * inputs.divergence(x, y);
                let proposed = config
                    .energy
                    .prox(v, inputs.evidence[i], inputs.drift[i], STEP);

                let prev = inputs.previous[i];
                let u = (prev + proposed).clamp(config.u_min, config.u_max);
                let d = u - prev;

                u_row[x] = u;
                d_row[x] = d;
                bar_row[x] = 2.0 * d - old;
            }
        });
}
