//! Frame placement, translation and velocity costs
//!
//! All three read the kinematics of one frame from the [`MultibodyData`]
//! snapshot. Frame Jacobians only depend on the configuration, so the
//! velocity half of `Rx` is zero except for the velocity cost.

use std::sync::Arc;

use nalgebra::{Isometry3, Matrix3xX};
use serde::{Deserialize, Serialize};

use kestrel_core::activation::{ActivationModel, ActivationQuad};
use kestrel_core::math::{jlog6, log6};
use kestrel_core::multibody::{FrameKinematics, MultibodyData};
use kestrel_core::state::{State, StateMultibody};
use kestrel_core::{DVec, ModelError, Motion, Vec3};

use crate::cost::{CostBase, CostData, CostModel};
use crate::error::CostResult;

/// Desired world placement of a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePlacement {
    pub frame: usize,
    pub placement: Isometry3<f64>,
}

/// Desired world position of a frame origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTranslation {
    pub frame: usize,
    pub translation: Vec3,
}

/// Desired local spatial velocity of a frame (linear first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMotion {
    pub frame: usize,
    pub motion: Motion,
}

fn check_frame(state: &StateMultibody, frame: usize) -> CostResult<()> {
    if frame >= state.model().frames().len() {
        return Err(ModelError::UnknownFrame(frame).into());
    }
    Ok(())
}

fn frame_data<'a>(kin: &'a MultibodyData, frame: usize) -> CostResult<&'a FrameKinematics> {
    Ok(kin.frame(frame)?)
}

/// Linear rows of a local frame Jacobian
fn linear_jacobian(frame: &FrameKinematics) -> Matrix3xX<f64> {
    frame.jacobian.fixed_rows::<3>(0).into_owned()
}

/// Cost on the full placement of a frame
///
/// The error is the SE(3) logarithm of the placement relative to the
/// reference:
///
/// ```text
/// r  = log6(Mref⁻¹ oMf)
/// Rx = [Jlog6(r) J, 0]
/// ```
#[derive(Debug, Clone)]
pub struct CostFramePlacement {
    base: CostBase,
    reference: FramePlacement,
}

impl CostFramePlacement {
    pub fn new(state: Arc<StateMultibody>, reference: FramePlacement) -> CostResult<Self> {
        let nu = state.nv();
        Self::with_activation(state, Arc::new(ActivationQuad::new(6)), reference, nu)
    }

    pub fn with_activation(
        state: Arc<StateMultibody>,
        activation: Arc<dyn ActivationModel>,
        reference: FramePlacement,
        nu: usize,
    ) -> CostResult<Self> {
        check_frame(&state, reference.frame)?;
        Ok(Self {
            base: CostBase::new(state, activation, 6, nu)?,
            reference,
        })
    }

    pub fn reference(&self) -> &FramePlacement {
        &self.reference
    }

    fn residual(&self, frame: &FrameKinematics) -> Motion {
        log6(&(self.reference.placement.inverse() * frame.placement))
    }
}

impl CostModel for CostFramePlacement {
    fn state(&self) -> &Arc<StateMultibody> {
        &self.base.state
    }

    fn activation(&self) -> &dyn ActivationModel {
        self.base.activation.as_ref()
    }

    fn nu(&self) -> usize {
        self.base.nu
    }

    fn calc(&self, data: &mut CostData, kin: &MultibodyData, x: &DVec, u: &DVec) -> CostResult<()> {
        self.base.check(data, kin, x, u)?;
        let r = self.residual(frame_data(kin, self.reference.frame)?);
        data.r.copy_from(&r);
        data.activate(self.activation());
        Ok(())
    }

    fn calc_diff(
        &self,
        data: &mut CostData,
        kin: &MultibodyData,
        x: &DVec,
        u: &DVec,
        recalc: bool,
    ) -> CostResult<()> {
        if recalc {
            self.calc(data, kin, x, u)?;
        } else {
            self.base.check(data, kin, x, u)?;
        }
        let frame = frame_data(kin, self.reference.frame)?;
        let nv = self.base.state.nv();

        let r = self.residual(frame);
        data.rx.fill(0.0);
        data.rx
            .columns_mut(0, nv)
            .copy_from(&(jlog6(&r) * &frame.jacobian));
        data.gauss_newton(self.activation());
        Ok(())
    }
}

/// Cost on the world position of a frame origin
///
/// ```text
/// r  = p - pref
/// Rx = [R J_lin, 0]
/// ```
#[derive(Debug, Clone)]
pub struct CostFrameTranslation {
    base: CostBase,
    reference: FrameTranslation,
}

impl CostFrameTranslation {
    pub fn new(state: Arc<StateMultibody>, reference: FrameTranslation) -> CostResult<Self> {
        let nu = state.nv();
        Self::with_activation(state, Arc::new(ActivationQuad::new(3)), reference, nu)
    }

    pub fn with_activation(
        state: Arc<StateMultibody>,
        activation: Arc<dyn ActivationModel>,
        reference: FrameTranslation,
        nu: usize,
    ) -> CostResult<Self> {
        check_frame(&state, reference.frame)?;
        Ok(Self {
            base: CostBase::new(state, activation, 3, nu)?,
            reference,
        })
    }

    pub fn reference(&self) -> &FrameTranslation {
        &self.reference
    }
}

impl CostModel for CostFrameTranslation {
    fn state(&self) -> &Arc<StateMultibody> {
        &self.base.state
    }

    fn activation(&self) -> &dyn ActivationModel {
        self.base.activation.as_ref()
    }

    fn nu(&self) -> usize {
        self.base.nu
    }

    fn calc(&self, data: &mut CostData, kin: &MultibodyData, x: &DVec, u: &DVec) -> CostResult<()> {
        self.base.check(data, kin, x, u)?;
        let frame = frame_data(kin, self.reference.frame)?;
        data.r
            .copy_from(&(frame.placement.translation.vector - self.reference.translation));
        data.activate(self.activation());
        Ok(())
    }

    fn calc_diff(
        &self,
        data: &mut CostData,
        kin: &MultibodyData,
        x: &DVec,
        u: &DVec,
        recalc: bool,
    ) -> CostResult<()> {
        if recalc {
            self.calc(data, kin, x, u)?;
        } else {
            self.base.check(data, kin, x, u)?;
        }
        let frame = frame_data(kin, self.reference.frame)?;
        let nv = self.base.state.nv();
        let rot = frame.placement.rotation.to_rotation_matrix().into_inner();

        data.rx.fill(0.0);
        data.rx
            .view_mut((0, 0), (3, nv))
            .copy_from(&(rot * linear_jacobian(frame)));
        data.gauss_newton(self.activation());
        Ok(())
    }
}

/// Cost on the local spatial velocity of a frame
///
/// ```text
/// r  = v - vref
/// Rx = [∂v/∂q, ∂v/∂v]
/// ```
#[derive(Debug, Clone)]
pub struct CostFrameVelocity {
    base: CostBase,
    reference: FrameMotion,
}

impl CostFrameVelocity {
    pub fn new(state: Arc<StateMultibody>, reference: FrameMotion) -> CostResult<Self> {
        let nu = state.nv();
        Self::with_activation(state, Arc::new(ActivationQuad::new(6)), reference, nu)
    }

    pub fn with_activation(
        state: Arc<StateMultibody>,
        activation: Arc<dyn ActivationModel>,
        reference: FrameMotion,
        nu: usize,
    ) -> CostResult<Self> {
        check_frame(&state, reference.frame)?;
        Ok(Self {
            base: CostBase::new(state, activation, 6, nu)?,
            reference,
        })
    }

    pub fn reference(&self) -> &FrameMotion {
        &self.reference
    }
}

impl CostModel for CostFrameVelocity {
    fn state(&self) -> &Arc<StateMultibody> {
        &self.base.state
    }

    fn activation(&self) -> &dyn ActivationModel {
        self.base.activation.as_ref()
    }

    fn nu(&self) -> usize {
        self.base.nu
    }

    fn calc(&self, data: &mut CostData, kin: &MultibodyData, x: &DVec, u: &DVec) -> CostResult<()> {
        self.base.check(data, kin, x, u)?;
        let frame = frame_data(kin, self.reference.frame)?;
        data.r.copy_from(&(frame.velocity - self.reference.motion));
        data.activate(self.activation());
        Ok(())
    }

    fn calc_diff(
        &self,
        data: &mut CostData,
        kin: &MultibodyData,
        x: &DVec,
        u: &DVec,
        recalc: bool,
    ) -> CostResult<()> {
        if recalc {
            self.calc(data, kin, x, u)?;
        } else {
            self.base.check(data, kin, x, u)?;
        }
        let frame = frame_data(kin, self.reference.frame)?;
        let nv = self.base.state.nv();

        data.rx.columns_mut(0, nv).copy_from(&frame.dv_dq);
        data.rx.columns_mut(nv, nv).copy_from(&frame.dv_dv);
        data.gauss_newton(self.activation());
        Ok(())
    }
}
