//! Centre-of-mass position cost

use std::sync::Arc;

use kestrel_core::activation::{ActivationModel, ActivationQuad};
use kestrel_core::multibody::MultibodyData;
use kestrel_core::state::{State, StateMultibody};
use kestrel_core::{DVec, Vec3};

use crate::cost::{CostBase, CostData, CostModel};
use crate::error::CostResult;

/// Cost on the world position of the centre of mass
///
/// ```text
/// r  = com - cref
/// Rx = [Jcom, 0]
/// ```
#[derive(Debug, Clone)]
pub struct CostComPosition {
    base: CostBase,
    cref: Vec3,
}

impl CostComPosition {
    /// Quadratic cost towards `cref`, with `nu = nv`
    pub fn new(state: Arc<StateMultibody>, cref: Vec3) -> CostResult<Self> {
        let nu = state.nv();
        Self::with_activation(state, Arc::new(ActivationQuad::new(3)), cref, nu)
    }

    pub fn with_activation(
        state: Arc<StateMultibody>,
        activation: Arc<dyn ActivationModel>,
        cref: Vec3,
        nu: usize,
    ) -> CostResult<Self> {
        Ok(Self {
            base: CostBase::new(state, activation, 3, nu)?,
            cref,
        })
    }

    pub fn reference(&self) -> &Vec3 {
        &self.cref
    }
}

impl CostModel for CostComPosition {
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
        data.r.copy_from(&(kin.com() - self.cref));
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
        let nv = self.base.state.nv();
        data.rx.fill(0.0);
        data.rx.columns_mut(0, nv).copy_from(kin.jacobian_com());
        data.gauss_newton(self.activation());
        Ok(())
    }
}
