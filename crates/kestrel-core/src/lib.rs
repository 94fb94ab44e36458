//! # Kestrel Core
//!
//! Building blocks shared by the multibody cost models in `kestrel-cost`.
//!
//! A cost model maps a robot state `x` and control `u` to a scalar cost
//! through a residual vector `r(x, u)` and an activation `a(r)`:
//!
//! ```text
//! cost = a(r(x, u))
//! ```
//!
//! ## Modules
//!
//! - [`math`]: SO(3) and SE(3) exponential/logarithm and their Jacobians
//! - [`state`]: state manifolds (Euclidean and multibody) with `diff`/`integrate`
//! - [`multibody`]: model topology and the kinematic snapshot read by costs
//! - [`activation`]: activation models turning residuals into scalar costs

pub mod math;
pub mod state;
pub mod multibody;
pub mod activation;
pub mod error;

pub use error::{ModelError, ModelResult};

// Common type aliases
use nalgebra::{DMatrix, DVector, Vector3, Vector6, Matrix3, UnitQuaternion};

/// Dynamically-sized vector
pub type DVec = DVector<f64>;

/// Dynamically-sized matrix
pub type DMat = DMatrix<f64>;

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// Spatial motion vector, linear part first: `[v; ω]`
pub type Motion = Vector6<f64>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f64>;

/// Unit quaternion type for rotations
pub type Quat = UnitQuaternion<f64>;
