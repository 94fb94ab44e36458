//! Activation models
//!
//! An activation turns a residual vector `r` into a scalar cost `a(r)` and
//! provides its gradient `Ar = ∂a/∂r` and Hessian `Arr = ∂²a/∂r²`. Cost
//! models chain these with the residual Jacobians (Gauss-Newton):
//!
//! ```text
//! Lx  = Rxᵀ Ar          Lxx = Rxᵀ Arr Rx
//! ```

mod quadratic;
mod weighted;
mod barrier;

pub use quadratic::*;
pub use weighted::*;
pub use barrier::*;

use crate::{DMat, DVec};

/// Activation value and derivatives
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationData {
    /// Activation value a(r)
    pub a_value: f64,
    /// Gradient ∂a/∂r
    pub ar: DVec,
    /// Hessian ∂²a/∂r²
    pub arr: DMat,
}

impl ActivationData {
    pub fn new(nr: usize) -> Self {
        Self {
            a_value: 0.0,
            ar: DVec::zeros(nr),
            arr: DMat::zeros(nr, nr),
        }
    }
}

/// Activation model interface
///
/// Residuals passed to `calc` / `calc_diff` must have length `nr()`; cost
/// models guarantee this when they are constructed.
pub trait ActivationModel: Send + Sync + std::fmt::Debug {
    /// Residual dimension
    fn nr(&self) -> usize;

    /// Compute the activation value
    fn calc(&self, data: &mut ActivationData, r: &DVec);

    /// Compute the activation derivatives, and the value as well when `recalc`
    fn calc_diff(&self, data: &mut ActivationData, r: &DVec, recalc: bool);

    fn create_data(&self) -> ActivationData {
        ActivationData::new(self.nr())
    }
}
