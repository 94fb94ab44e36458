//! Cost-model abstraction
//!
//! A [`CostModel`] is immutable and shareable; everything it computes goes
//! into a [`CostData`] created by [`CostModel::create_data`] and owned by
//! the caller. Kinematic quantities are read from a [`MultibodyData`]
//! snapshot that must already match the state being evaluated.

use std::sync::Arc;

use kestrel_core::activation::{ActivationData, ActivationModel};
use kestrel_core::multibody::MultibodyData;
use kestrel_core::state::{State, StateMultibody};
use kestrel_core::{DMat, DVec};

use crate::error::{check_dim, CostError, CostResult};

/// Values and derivatives computed by a cost model
#[derive(Debug, Clone)]
pub struct CostData {
    /// Activation value and derivatives
    pub activation: ActivationData,
    /// Cost value
    pub cost: f64,
    /// Residual (nr)
    pub r: DVec,
    /// Residual Jacobian w.r.t. the state tangent (nr × ndx)
    pub rx: DMat,
    /// Residual Jacobian w.r.t. the control (nr × nu)
    pub ru: DMat,
    /// Cost gradient w.r.t. the state (ndx)
    pub lx: DVec,
    /// Cost gradient w.r.t. the control (nu)
    pub lu: DVec,
    /// Cost Hessian w.r.t. the state (ndx × ndx)
    pub lxx: DMat,
    /// Cross Hessian (ndx × nu)
    pub lxu: DMat,
    /// Cost Hessian w.r.t. the control (nu × nu)
    pub luu: DMat,
}

impl CostData {
    /// Zero-initialized data for a cost with the given dimensions
    pub fn new(ndx: usize, nu: usize, activation: &dyn ActivationModel) -> Self {
        let nr = activation.nr();
        Self {
            activation: activation.create_data(),
            cost: 0.0,
            r: DVec::zeros(nr),
            rx: DMat::zeros(nr, ndx),
            ru: DMat::zeros(nr, nu),
            lx: DVec::zeros(ndx),
            lu: DVec::zeros(nu),
            lxx: DMat::zeros(ndx, ndx),
            lxu: DMat::zeros(ndx, nu),
            luu: DMat::zeros(nu, nu),
        }
    }

    /// Assemble the Gauss-Newton derivatives from `r`, `Rx` and `Ru`
    ///
    /// Expects `r` (and the cost value) to be current; only the activation
    /// derivatives are recomputed.
    pub(crate) fn gauss_newton(&mut self, activation: &dyn ActivationModel) {
        activation.calc_diff(&mut self.activation, &self.r, false);

        let arr_rx = &self.activation.arr * &self.rx;
        let arr_ru = &self.activation.arr * &self.ru;
        self.lx = self.rx.tr_mul(&self.activation.ar);
        self.lu = self.ru.tr_mul(&self.activation.ar);
        self.lxx = self.rx.tr_mul(&arr_rx);
        self.lxu = self.rx.tr_mul(&arr_ru);
        self.luu = self.ru.tr_mul(&arr_ru);
    }

    /// Evaluate the activation on the current residual
    pub(crate) fn activate(&mut self, activation: &dyn ActivationModel) {
        activation.calc(&mut self.activation, &self.r);
        self.cost = self.activation.a_value;
    }
}

/// Cost model interface
pub trait CostModel: Send + Sync + std::fmt::Debug {
    /// State manifold the cost is defined on
    fn state(&self) -> &Arc<StateMultibody>;

    /// Activation applied to the residual
    fn activation(&self) -> &dyn ActivationModel;

    /// Control dimension
    fn nu(&self) -> usize;

    /// Residual dimension
    fn nr(&self) -> usize {
        self.activation().nr()
    }

    fn create_data(&self) -> CostData {
        CostData::new(self.state().ndx(), self.nu(), self.activation())
    }

    /// Compute the residual and the cost value
    fn calc(&self, data: &mut CostData, kin: &MultibodyData, x: &DVec, u: &DVec) -> CostResult<()>;

    /// Compute the residual Jacobians and the Gauss-Newton derivatives
    ///
    /// With `recalc`, the residual and cost value are refreshed first;
    /// otherwise they are taken from the last [`CostModel::calc`].
    fn calc_diff(
        &self,
        data: &mut CostData,
        kin: &MultibodyData,
        x: &DVec,
        u: &DVec,
        recalc: bool,
    ) -> CostResult<()>;

    /// [`CostModel::calc`] with a zero control, for terminal nodes
    fn calc_terminal(&self, data: &mut CostData, kin: &MultibodyData, x: &DVec) -> CostResult<()> {
        self.calc(data, kin, x, &DVec::zeros(self.nu()))
    }

    /// [`CostModel::calc_diff`] with a zero control, for terminal nodes
    fn calc_diff_terminal(
        &self,
        data: &mut CostData,
        kin: &MultibodyData,
        x: &DVec,
        recalc: bool,
    ) -> CostResult<()> {
        self.calc_diff(data, kin, x, &DVec::zeros(self.nu()), recalc)
    }
}

/// Fields and checks shared by every residual cost
#[derive(Debug, Clone)]
pub(crate) struct CostBase {
    pub state: Arc<StateMultibody>,
    pub activation: Arc<dyn ActivationModel>,
    pub nu: usize,
}

impl CostBase {
    /// Validate that `activation` matches a residual of dimension `nr`
    pub fn new(
        state: Arc<StateMultibody>,
        activation: Arc<dyn ActivationModel>,
        nr: usize,
        nu: usize,
    ) -> CostResult<Self> {
        if activation.nr() != nr {
            return Err(CostError::ActivationDimension {
                expected: nr,
                got: activation.nr(),
            });
        }
        Ok(Self { state, activation, nu })
    }

    /// Check the dimensions of a call's arguments
    pub fn check(&self, data: &CostData, kin: &MultibodyData, x: &DVec, u: &DVec) -> CostResult<()> {
        check_call(&self.state, self.activation.nr(), self.nu, data, kin, x, u)
    }
}

/// Check `x`, `u`, the snapshot and every buffer of `data` against a cost
/// with residual dimension `nr` and control dimension `nu`
pub(crate) fn check_call(
    state: &StateMultibody,
    nr: usize,
    nu: usize,
    data: &CostData,
    kin: &MultibodyData,
    x: &DVec,
    u: &DVec,
) -> CostResult<()> {
    let ndx = state.ndx();
    check_dim("x", state.nx(), x.len())?;
    check_dim("u", nu, u.len())?;
    check_dim("kinematic data nv", state.nv(), kin.nv())?;
    check_dim("cost data residual", nr, data.r.len())?;
    check_dim("cost data activation", nr, data.activation.ar.len())?;
    check_dim("cost data rx rows", nr, data.rx.nrows())?;
    check_dim("cost data rx cols", ndx, data.rx.ncols())?;
    check_dim("cost data ru rows", nr, data.ru.nrows())?;
    check_dim("cost data ru cols", nu, data.ru.ncols())?;
    check_dim("cost data ndx", ndx, data.lx.len())?;
    check_dim("cost data nu", nu, data.lu.len())
}
