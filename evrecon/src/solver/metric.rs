//! Manifold metric derived from the last-update timestamp map.
//!
//! Two neighbouring pixels whose most recent events are far apart in time
//! are unlikely to belong to the same moving edge, so the TV coupling between
//! them is attenuated:
//!
//! ```text
//! w = 1 / sqrt(1 + (ΔT · time_constant / time_scale)²)      w ∈ (0, 1]
//! ```
//!
//! Edges leaving the grid get weight 0, which gives the discrete gradient
//! Neumann boundary conditions.

use rayon::prelude::*;

/// Smoothing weight for a pair of pixel timestamps.
#[inline]
pub fn edge_weight(a: u64, b: u64, time_constant: f64, time_scale: f64) -> f32 {
    let gap = a.abs_diff(b) as f64 * time_constant / time_scale;
    (1.0 / (1.0 + gap * gap).sqrt()) as f32
}

/// Drift weight `lambda_t · m` for a pixel last updated at `last_update`.
///
/// `m` is the time, in seconds, between the pixel's last event and the end of
/// the window being solved.
#[inline]
pub fn drift_weight(lambda_t: f32, window_end: u64, last_update: u64, time_constant: f64) -> f32 {
    let elapsed = window_end.saturating_sub(last_update) as f64 * time_constant;
    (f64::from(lambda_t) * elapsed) as f32
}

/// Fill the horizontal and vertical edge weights for a timestamp grid.
///
/// `weight_x[i]` couples pixel `i` with its right neighbour and `weight_y[i]`
/// with the pixel below.
pub fn fill_edge_weights(
    timestamps: &[u64],
    width: usize,
    height: usize,
    time_constant: f64,
    time_scale: f64,
    weight_x: &mut [f32],
    weight_y: &mut [f32],
) {
    weight_x
        .par_chunks_mut(width)
        .zip(weight_y.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (row_x, row_y))| {
            let base = y * width;
            for x in 0..width {
                let here = timestamps[base + x];
                row_x[x] = if x + 1 < width {
                    edge_weight(here, timestamps[base + x + 1], time_constant, time_scale)
                } else {
                    0.0
                };
                row_y[x] = if y + 1 < height {
                    edge_weight(here, timestamps[base + width + x], time_constant, time_scale)
                } else {
                    0.0
                };
            }
        });
}
