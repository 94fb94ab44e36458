//! State manifolds
//!
//! A state lives on a manifold of dimension `ndx` embedded in a vector of
//! size `nx`. Differences between states and increments applied to states
//! are tangent vectors of size `ndx`:
//!
//! ```text
//! dx = diff(x0, x1)        x1 = integrate(x0, dx)
//! ```
//!
//! Cost residuals such as `diff(xref, x)` are differentiated through
//! [`State::jdiff`] and [`State::jintegrate`].

mod vector;
mod multibody;

pub use vector::*;
pub use multibody::*;

use rand::RngCore;

use crate::error::ModelResult;
use crate::{DMat, DVec};

/// Which Jacobian blocks to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jcomponent {
    Both,
    First,
    Second,
}

impl Jcomponent {
    fn first(&self) -> bool {
        matches!(self, Jcomponent::Both | Jcomponent::First)
    }

    fn second(&self) -> bool {
        matches!(self, Jcomponent::Both | Jcomponent::Second)
    }
}

/// Jacobians of a two-argument state operation
///
/// A block that was not requested through [`Jcomponent`] is left empty
/// (0 × 0).
#[derive(Debug, Clone)]
pub struct Jacobians {
    /// Derivative with respect to the first argument (ndx × ndx)
    pub first: DMat,
    /// Derivative with respect to the second argument (ndx × ndx)
    pub second: DMat,
}

impl Jacobians {
    fn allocate(ndx: usize, which: Jcomponent) -> Self {
        let size = |wanted: bool| if wanted { ndx } else { 0 };
        Self {
            first: DMat::zeros(size(which.first()), size(which.first())),
            second: DMat::zeros(size(which.second()), size(which.second())),
        }
    }
}

/// State manifold interface
pub trait State: Send + Sync + std::fmt::Debug {
    /// Dimension of the state vector
    fn nx(&self) -> usize;

    /// Dimension of the tangent space
    fn ndx(&self) -> usize;

    /// Dimension of the configuration vector
    fn nq(&self) -> usize;

    /// Dimension of the velocity vector
    fn nv(&self) -> usize;

    /// Neutral state
    fn zero(&self) -> DVec;

    /// Random state
    fn rand(&self, rng: &mut dyn RngCore) -> DVec;

    /// Tangent vector taking `x0` to `x1`
    fn diff(&self, x0: &DVec, x1: &DVec) -> ModelResult<DVec>;

    /// State reached from `x` along `dx`
    fn integrate(&self, x: &DVec, dx: &DVec) -> ModelResult<DVec>;

    /// Jacobians of `diff(x0, x1)` with respect to `x0` and `x1`
    fn jdiff(&self, x0: &DVec, x1: &DVec, which: Jcomponent) -> ModelResult<Jacobians>;

    /// Jacobians of `integrate(x, dx)` with respect to `x` and `dx`
    fn jintegrate(&self, x: &DVec, dx: &DVec, which: Jcomponent) -> ModelResult<Jacobians>;
}
