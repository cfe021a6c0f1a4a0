//! Data-term variants and their proximal operators.
//!
//! The primal step of the solver minimizes, independently per pixel,
//!
//! ```text
//! (d - v)² / (2τ)  +  D(d - a)  +  β·d²
//! ```
//!
//! where `v` is the gradient-stepped increment, `a` the pending evidence
//! and `β = lambda_t · m` the drift weight. Each [`EnergyModel`] picks `D`.

use std::fmt;

/// Closed set of supported data-term / regularizer pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnergyModel {
    /// Log-domain squared error with TV regularization.
    #[default]
    TvLogL2,
    /// Log-domain absolute error with TV regularization.
    ///
    /// More robust to isolated bursts of noisy events.
    TvLogL1,
}

impl EnergyModel {
    /// Solve the per-pixel proximal problem.
    ///
    /// * `v` - increment after the dual (divergence) step
    /// * `evidence` - pending accumulator value `a`
    /// * `drift` - drift weight `β >= 0`
    /// * `tau` - primal step size
    #[inline]
    pub fn prox(self, v: f32, evidence: f32, drift: f32, tau: f32) -> f32 {
        match self {
            EnergyModel::TvLogL2 => {
                (v + 2.0 * tau * evidence) / (1.0 + 2.0 * tau * (1.0 + drift))
            }
            EnergyModel::TvLogL1 => {
                let scale = 1.0 + 2.0 * tau * drift;
                let above = (v - tau) / scale;
                let below = (v + tau) / scale;
                if above > evidence {
                    above
                } else if below < evidence {
                    below
                } else {
                    evidence
                }
            }
        }
    }

    /// Short identifier used in logs and CLI values.
    pub fn name(self) -> &'static str {
        match self {
            EnergyModel::TvLogL2 => "tv-log-l2",
            EnergyModel::TvLogL1 => "tv-log-l1",
        }
    }
}

impl fmt::Display for EnergyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
