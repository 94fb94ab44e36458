//! Finite-difference cost derivatives
//!
//! [`CostNumDiff`] wraps any cost model and replaces its residual Jacobians
//! with forward differences taken on the state manifold:
//!
//! ```text
//! Rx[:, i] = (r(x ⊕ h eᵢ, u) - r(x, u)) / h
//! Ru[:, j] = (r(x, u + h eⱼ) - r(x, u)) / h
//! ```
//!
//! The Gauss-Newton terms are then assembled exactly as in the analytic
//! costs, so the wrapper is a drop-in reference for derivative checks.

use std::fmt;
use std::sync::Arc;

use kestrel_core::activation::ActivationModel;
use kestrel_core::multibody::{KinematicsUpdate, MultibodyData};
use kestrel_core::state::{State, StateMultibody};
use kestrel_core::DVec;

use crate::cost::{check_call, CostData, CostModel};
use crate::error::CostResult;

/// Cost model with finite-difference derivatives
#[derive(Clone)]
pub struct CostNumDiff {
    model: Arc<dyn CostModel>,
    kinematics: Option<Arc<dyn KinematicsUpdate>>,
    disturbance: f64,
}

impl CostNumDiff {
    /// Wrap `model`, with the default disturbance `√(2ε)`
    pub fn new(model: Arc<dyn CostModel>) -> Self {
        Self {
            model,
            kinematics: None,
            disturbance: (2.0 * f64::EPSILON).sqrt(),
        }
    }

    /// Refresh the kinematic snapshot at every perturbed state
    ///
    /// Without it, the snapshot passed to `calc_diff` is reused as is, which
    /// is only correct for costs that do not read kinematics.
    pub fn with_kinematics(mut self, kinematics: Arc<dyn KinematicsUpdate>) -> Self {
        self.kinematics = Some(kinematics);
        self
    }

    pub fn with_disturbance(mut self, disturbance: f64) -> Self {
        self.disturbance = disturbance;
        self
    }

    pub fn model(&self) -> &Arc<dyn CostModel> {
        &self.model
    }

    pub fn disturbance(&self) -> f64 {
        self.disturbance
    }

    /// Residual at a perturbed state
    fn perturbed_residual(
        &self,
        scratch: &mut CostData,
        kin: &MultibodyData,
        x: &DVec,
        u: &DVec,
    ) -> CostResult<()> {
        match &self.kinematics {
            Some(update) => {
                let state = self.model.state();
                let (q, v) = state.split(x)?;
                let mut fresh = kin.clone();
                update.update(state.model(), &mut fresh, &q, &v)?;
                self.model.calc(scratch, &fresh, x, u)
            }
            None => self.model.calc(scratch, kin, x, u),
        }
    }
}

impl fmt::Debug for CostNumDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CostNumDiff")
            .field("model", &self.model)
            .field("kinematics", &self.kinematics.is_some())
            .field("disturbance", &self.disturbance)
            .finish()
    }
}

impl CostModel for CostNumDiff {
    fn state(&self) -> &Arc<StateMultibody> {
        self.model.state()
    }

    fn activation(&self) -> &dyn ActivationModel {
        self.model.activation()
    }

    fn nu(&self) -> usize {
        self.model.nu()
    }

    fn calc(&self, data: &mut CostData, kin: &MultibodyData, x: &DVec, u: &DVec) -> CostResult<()> {
        self.model.calc(data, kin, x, u)
    }

    fn calc_diff(
        &self,
        data: &mut CostData,
        kin: &MultibodyData,
        x: &DVec,
        u: &DVec,
        recalc: bool,
    ) -> CostResult<()> {
        check_call(self.state(), self.nr(), self.nu(), data, kin, x, u)?;
        if recalc {
            self.calc(data, kin, x, u)?;
        }
        let h = self.disturbance;
        let state = self.model.state();
        let r0 = data.r.clone();
        let mut scratch = self.model.create_data();

        let mut dx = DVec::zeros(state.ndx());
        for i in 0..state.ndx() {
            dx[i] = h;
            let xp = state.integrate(x, &dx)?;
            self.perturbed_residual(&mut scratch, kin, &xp, u)?;
            data.rx.set_column(i, &((&scratch.r - &r0) / h));
            dx[i] = 0.0;
        }

        let mut up = u.clone();
        for j in 0..u.len() {
            up[j] += h;
            self.model.calc(&mut scratch, kin, x, &up)?;
            data.ru.set_column(j, &((&scratch.r - &r0) / h));
            up[j] = u[j];
        }

        data.gauss_newton(self.activation());
        Ok(())
    }
}
