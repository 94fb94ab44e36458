//! Kestrel cost models
//!
//! Residual-based cost models for multibody optimal control, their weighted
//! aggregation, and a finite-difference wrapper for checking derivatives.
//!
//! # Formulation
//!
//! Every cost is an activation of a residual:
//!
//! ```text
//! ℓ(x, u) = a(r(x, u))
//! Lx  = Rxᵀ Ar          Lu  = Ruᵀ Ar
//! Lxx = Rxᵀ Arr Rx      Lxu = Rxᵀ Arr Ru      Luu = Ruᵀ Arr Ru
//! ```
//!
//! Evaluation happens in two phases: [`CostModel::calc`] computes the
//! residual and the cost value only, while [`CostModel::calc_diff`] also
//! computes the Gauss-Newton derivatives. The value-only phase is what a
//! line search needs.
//!
//! # Components
//!
//! - [`cost`]: the cost-model trait and its data
//! - [`costs`]: state, control, centre-of-mass and frame costs
//! - [`sum`]: named, weighted aggregation of costs
//! - [`numdiff`]: finite-difference derivatives of any cost
//! - [`config`]: JSON description of a cost set

pub mod error;
pub mod cost;
pub mod costs;
pub mod sum;
pub mod numdiff;
pub mod config;

// Re-exports
pub use error::{CostError, CostResult};
pub use cost::{CostData, CostModel};
pub use costs::*;
pub use sum::{CostDataSum, CostItem, CostModelSum};
pub use numdiff::CostNumDiff;
pub use config::CostSetConfig;
