//! Quadratic barrier activation
//!
//! Penalizes residual components only when they leave a box:
//!
//! ```text
//! a(r) = ½ ‖max(r - ub, 0)‖² + ½ ‖min(r - lb, 0)‖²
//! ```

use serde::Serialize;

use super::{ActivationData, ActivationModel};
use crate::error::{ModelError, ModelResult};
use crate::DVec;

/// Box bounds on the residual
///
/// The effective bounds are narrowed about their midpoint by `beta`:
///
/// ```text
/// m = (lb + ub) / 2      d = (ub - lb) / 2
/// lb' = m - β d          ub' = m + β d
/// ```
///
/// Components with an infinite bound are kept as given. Bounds are only
/// built through [`ActivationBounds::new`], so they serialize but do not
/// deserialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivationBounds {
    lb: DVec,
    ub: DVec,
    beta: f64,
}

impl ActivationBounds {
    /// Build bounds, checking `lb ≤ ub` component-wise and `β ∈ (0, 1]`
    pub fn new(mut lb: DVec, mut ub: DVec, beta: f64) -> ModelResult<Self> {
        if lb.len() != ub.len() {
            return Err(ModelError::InvalidBounds(format!(
                "lower bound has {} components, upper bound has {}",
                lb.len(),
                ub.len()
            )));
        }
        if lb.iter().zip(ub.iter()).any(|(l, u)| !(l <= u)) {
            return Err(ModelError::InvalidBounds("lower bound exceeds upper bound".into()));
        }
        if !(beta > 0.0 && beta <= 1.0) {
            return Err(ModelError::InvalidBounds(format!("beta {beta} must lie in (0, 1]")));
        }

        for i in 0..lb.len() {
            if lb[i].is_finite() && ub[i].is_finite() {
                let m = 0.5 * (lb[i] + ub[i]);
                let d = 0.5 * (ub[i] - lb[i]);
                lb[i] = m - beta * d;
                ub[i] = m + beta * d;
            }
        }
        Ok(Self { lb, ub, beta })
    }

    /// Effective lower bound
    pub fn lb(&self) -> &DVec {
        &self.lb
    }

    /// Effective upper bound
    pub fn ub(&self) -> &DVec {
        &self.ub
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn len(&self) -> usize {
        self.lb.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lb.is_empty()
    }
}

/// Quadratic barrier activation
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationQuadBarrier {
    bounds: ActivationBounds,
}

impl ActivationQuadBarrier {
    pub fn new(bounds: ActivationBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &ActivationBounds {
        &self.bounds
    }

    /// Signed violation of each component (zero inside the box)
    fn violation(&self, r: &DVec) -> DVec {
        DVec::from_fn(r.len(), |i, _| {
            let (lo, hi) = (self.bounds.lb[i], self.bounds.ub[i]);
            if r[i] > hi {
                r[i] - hi
            } else if r[i] < lo {
                r[i] - lo
            } else {
                0.0
            }
        })
    }
}

impl ActivationModel for ActivationQuadBarrier {
    fn nr(&self) -> usize {
        self.bounds.len()
    }

    fn calc(&self, data: &mut ActivationData, r: &DVec) {
        debug_assert_eq!(r.len(), self.nr(), "r has wrong dimension");
        data.a_value = 0.5 * self.violation(r).norm_squared();
    }

    fn calc_diff(&self, data: &mut ActivationData, r: &DVec, recalc: bool) {
        if recalc {
            self.calc(data, r);
        }
        data.ar = self.violation(r);
        data.arr.fill(0.0);
        for i in 0..r.len() {
            if r[i] <= self.bounds.lb[i] || r[i] >= self.bounds.ub[i] {
                data.arr[(i, i)] = 1.0;
            }
        }
    }
}
