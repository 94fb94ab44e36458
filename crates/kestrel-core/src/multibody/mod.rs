//! Multibody model topology and kinematic snapshots
//!
//! Rigid-body kinematics live outside this crate. A kinematics library
//! plugs in through [`KinematicsUpdate`], which refreshes a
//! [`MultibodyData`] snapshot for a given `(q, v)`.

mod model;
mod data;

pub use model::*;
pub use data::*;

use crate::error::ModelResult;
use crate::DVec;

/// Refreshes a kinematic snapshot for a configuration and velocity
///
/// Implementations are expected to fill frame placements, local frame
/// Jacobians, frame velocities with their partial derivatives, and the
/// centre of mass with its Jacobian, using the tangent conventions of
/// [`StateMultibody`](crate::state::StateMultibody).
pub trait KinematicsUpdate: Send + Sync {
    fn update(&self, model: &Model, data: &mut MultibodyData, q: &DVec, v: &DVec) -> ModelResult<()>;
}
