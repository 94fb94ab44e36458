//! Control regularization cost

use std::sync::Arc;

use kestrel_core::activation::{ActivationModel, ActivationQuad};
use kestrel_core::multibody::MultibodyData;
use kestrel_core::state::{State, StateMultibody};
use kestrel_core::{DMat, DVec};

use crate::cost::{CostBase, CostData, CostModel};
use crate::error::CostResult;

/// Cost on the deviation of the control from a reference
///
/// ```text
/// r = u - uref      Ru = I
/// ```
#[derive(Debug, Clone)]
pub struct CostControl {
    base: CostBase,
    uref: DVec,
}

impl CostControl {
    /// Quadratic cost towards zero control, with `nu = nv`
    pub fn new(state: Arc<StateMultibody>) -> CostResult<Self> {
        let uref = DVec::zeros(state.nv());
        Self::with_reference(state, uref)
    }

    /// Quadratic cost towards `uref`; `nu` is the reference size
    pub fn with_reference(state: Arc<StateMultibody>, uref: DVec) -> CostResult<Self> {
        let activation = Arc::new(ActivationQuad::new(uref.len()));
        Self::with_activation(state, activation, uref)
    }

    pub fn with_activation(
        state: Arc<StateMultibody>,
        activation: Arc<dyn ActivationModel>,
        uref: DVec,
    ) -> CostResult<Self> {
        let nu = uref.len();
        Ok(Self {
            base: CostBase::new(state, activation, nu, nu)?,
            uref,
        })
    }

    pub fn reference(&self) -> &DVec {
        &self.uref
    }
}

impl CostModel for CostControl {
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
        data.r = u - &self.uref;
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
        data.ru = DMat::identity(self.base.nu, self.base.nu);
        data.gauss_newton(self.activation());
        Ok(())
    }
}
