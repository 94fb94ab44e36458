//! Kinematic snapshot read by the cost models
//!
//! Cost models never run kinematics themselves. They read frame placements,
//! Jacobians, velocities and centre-of-mass quantities from a
//! [`MultibodyData`] that an external kinematics library has filled for the
//! current state.
//!
//! Conventions:
//! - Frame Jacobians and velocities are expressed in the LOCAL frame, with
//!   the linear part in rows 0..3 and the angular part in rows 3..6.
//! - `dv_dq` / `dv_dv` are the partial derivatives of the local frame
//!   velocity with respect to the configuration tangent and the velocity.
//! - The centre-of-mass Jacobian is expressed in the world frame.

use nalgebra::Isometry3;
use rand::Rng;

use crate::error::{check_dim, ModelError, ModelResult};
use crate::math::{random_motion, random_placement, random_vector3};
use crate::multibody::Model;
use crate::{DMat, Motion, Vec3};

/// Kinematic quantities of a single frame
#[derive(Debug, Clone)]
pub struct FrameKinematics {
    /// World placement of the frame (oMf)
    pub placement: Isometry3<f64>,
    /// Local frame Jacobian (6 × nv)
    pub jacobian: DMat,
    /// Local spatial velocity
    pub velocity: Motion,
    /// ∂v/∂q of the local spatial velocity (6 × nv)
    pub dv_dq: DMat,
    /// ∂v/∂v of the local spatial velocity (6 × nv)
    pub dv_dv: DMat,
}

impl FrameKinematics {
    /// Zero-initialized frame kinematics for a system with `nv` velocities
    pub fn zeros(nv: usize) -> Self {
        Self {
            placement: Isometry3::identity(),
            jacobian: DMat::zeros(6, nv),
            velocity: Motion::zeros(),
            dv_dq: DMat::zeros(6, nv),
            dv_dv: DMat::zeros(6, nv),
        }
    }

    fn check(&self, nv: usize) -> ModelResult<()> {
        for (what, m) in [
            ("frame jacobian", &self.jacobian),
            ("frame dv_dq", &self.dv_dq),
            ("frame dv_dv", &self.dv_dv),
        ] {
            check_dim(what, 6, m.nrows())?;
            check_dim(what, nv, m.ncols())?;
        }
        Ok(())
    }
}

/// Kinematic snapshot of a multibody system at one state
#[derive(Debug, Clone)]
pub struct MultibodyData {
    nv: usize,
    frames: Vec<FrameKinematics>,
    com: Vec3,
    jacobian_com: DMat,
}

impl MultibodyData {
    /// Zero-filled snapshot sized for `model`
    pub fn new(model: &Model) -> Self {
        let nv = model.nv();
        Self {
            nv,
            frames: vec![FrameKinematics::zeros(nv); model.frames().len()],
            com: Vec3::zeros(),
            jacobian_com: DMat::zeros(3, nv),
        }
    }

    /// Snapshot filled with random values of the right shape
    ///
    /// The values are not kinematically consistent with any state. They
    /// exercise code that only reads the snapshot, such as comparing two
    /// cost implementations against each other.
    pub fn random<R: Rng + ?Sized>(model: &Model, rng: &mut R) -> Self {
        let nv = model.nv();
        let mut rand_mat = |rows: usize| DMat::from_fn(rows, nv, |_, _| rng.gen_range(-1.0..=1.0));

        let jacobian_com = rand_mat(3);
        let mut frames = Vec::with_capacity(model.frames().len());
        for _ in model.frames() {
            let jacobian = rand_mat(6);
            let dv_dq = rand_mat(6);
            let dv_dv = rand_mat(6);
            frames.push(FrameKinematics {
                placement: Isometry3::identity(),
                jacobian,
                velocity: Motion::zeros(),
                dv_dq,
                dv_dv,
            });
        }
        for frame in &mut frames {
            frame.placement = random_placement(rng);
            frame.velocity = random_motion(rng);
        }

        Self {
            nv,
            frames,
            com: random_vector3(rng),
            jacobian_com,
        }
    }

    /// Velocity dimension the snapshot was sized for
    pub fn nv(&self) -> usize {
        self.nv
    }

    /// Number of frames
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Kinematics of frame `id`
    pub fn frame(&self, id: usize) -> ModelResult<&FrameKinematics> {
        self.frames.get(id).ok_or(ModelError::UnknownFrame(id))
    }

    /// Replace the kinematics of frame `id`
    pub fn set_frame(&mut self, id: usize, frame: FrameKinematics) -> ModelResult<()> {
        frame.check(self.nv)?;
        let slot = self.frames.get_mut(id).ok_or(ModelError::UnknownFrame(id))?;
        *slot = frame;
        Ok(())
    }

    /// Centre of mass in the world frame
    pub fn com(&self) -> &Vec3 {
        &self.com
    }

    /// Centre-of-mass Jacobian (3 × nv)
    pub fn jacobian_com(&self) -> &DMat {
        &self.jacobian_com
    }

    /// Replace the centre of mass and its Jacobian
    pub fn set_com(&mut self, com: Vec3, jacobian: DMat) -> ModelResult<()> {
        check_dim("com jacobian rows", 3, jacobian.nrows())?;
        check_dim("com jacobian cols", self.nv, jacobian.ncols())?;
        self.com = com;
        self.jacobian_com = jacobian;
        Ok(())
    }
}
