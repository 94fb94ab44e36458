//! State regularization cost

use std::sync::Arc;

use kestrel_core::activation::{ActivationModel, ActivationQuad};
use kestrel_core::multibody::MultibodyData;
use kestrel_core::state::{Jcomponent, State, StateMultibody};
use kestrel_core::DVec;

use crate::cost::{CostBase, CostData, CostModel};
use crate::error::{check_dim, CostResult};

/// Cost on the deviation of the state from a reference
///
/// ```text
/// r  = diff(xref, x)
/// Rx = ∂diff(xref, x)/∂x
/// ```
#[derive(Debug, Clone)]
pub struct CostState {
    base: CostBase,
    xref: DVec,
}

impl CostState {
    /// Quadratic cost towards the neutral state, with `nu = nv`
    pub fn new(state: Arc<StateMultibody>) -> CostResult<Self> {
        let xref = state.zero();
        Self::with_reference(state, xref)
    }

    /// Quadratic cost towards `xref`, with `nu = nv`
    pub fn with_reference(state: Arc<StateMultibody>, xref: DVec) -> CostResult<Self> {
        let activation = Arc::new(ActivationQuad::new(state.ndx()));
        let nu = state.nv();
        Self::with_activation(state, activation, xref, nu)
    }

    pub fn with_activation(
        state: Arc<StateMultibody>,
        activation: Arc<dyn ActivationModel>,
        xref: DVec,
        nu: usize,
    ) -> CostResult<Self> {
        check_dim("xref", state.nx(), xref.len())?;
        let nr = state.ndx();
        Ok(Self {
            base: CostBase::new(state, activation, nr, nu)?,
            xref,
        })
    }

    pub fn reference(&self) -> &DVec {
        &self.xref
    }
}

impl CostModel for CostState {
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
        data.r = self.base.state.diff(&self.xref, x)?;
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
        data.rx = self.base.state.jdiff(&self.xref, x, Jcomponent::Second)?.second;
        data.gauss_newton(self.activation());
        Ok(())
    }
}
