//! Weighted sum of named cost models
//!
//! Items are kept in name order, which fixes the layout of the stacked
//! residual:
//!
//! ```text
//! cost = Σ wᵢ costᵢ         r = [√w₀ r₀; √w₁ r₁; ...]
//! Lx   = Σ wᵢ Lxᵢ           Rx = [√w₀ Rx₀; √w₁ Rx₁; ...]
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use kestrel_core::multibody::MultibodyData;
use kestrel_core::state::{State, StateMultibody};
use kestrel_core::{DMat, DVec};

use crate::cost::{CostData, CostModel};
use crate::error::{check_dim, CostError, CostResult};

/// A cost model and its weight in the sum
#[derive(Debug, Clone)]
pub struct CostItem {
    pub cost: Arc<dyn CostModel>,
    pub weight: f64,
}

/// Data of a [`CostModelSum`]
#[derive(Debug, Clone)]
pub struct CostDataSum {
    /// Per-item data, keyed like the model's items
    pub costs: BTreeMap<String, CostData>,
    pub cost: f64,
    pub r: DVec,
    pub rx: DMat,
    pub ru: DMat,
    pub lx: DVec,
    pub lu: DVec,
    pub lxx: DMat,
    pub lxu: DMat,
    pub luu: DMat,
}

/// Named collection of weighted cost models
#[derive(Debug, Clone)]
pub struct CostModelSum {
    state: Arc<StateMultibody>,
    items: BTreeMap<String, CostItem>,
    nu: usize,
    nr: usize,
}

impl CostModelSum {
    pub fn new(state: Arc<StateMultibody>, nu: usize) -> Self {
        Self {
            state,
            items: BTreeMap::new(),
            nu,
            nr: 0,
        }
    }

    /// Empty sum with `nu = nv`
    pub fn with_default_nu(state: Arc<StateMultibody>) -> Self {
        let nu = state.nv();
        Self::new(state, nu)
    }

    /// Add a named cost
    ///
    /// The cost must share the sum's control dimension, and the weight must
    /// be finite and non-negative.
    pub fn add_cost(&mut self, name: &str, cost: Arc<dyn CostModel>, weight: f64) -> CostResult<()> {
        if self.items.contains_key(name) {
            warn!(cost = name, "cost item already exists");
            return Err(CostError::AlreadyExists(name.to_string()));
        }
        if cost.nu() != self.nu {
            return Err(CostError::NuMismatch {
                name: name.to_string(),
                expected: self.nu,
                got: cost.nu(),
            });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(CostError::InvalidWeight {
                name: name.to_string(),
                weight,
            });
        }
        if weight == 0.0 {
            warn!(cost = name, "cost item added with zero weight");
        }

        self.nr += cost.nr();
        debug!(cost = name, weight = weight, nr = cost.nr(), total_nr = self.nr, "added cost item");
        self.items.insert(name.to_string(), CostItem { cost, weight });
        Ok(())
    }

    /// Remove a named cost
    pub fn remove_cost(&mut self, name: &str) -> CostResult<CostItem> {
        let Some(item) = self.items.remove(name) else {
            warn!(cost = name, "cost item does not exist");
            return Err(CostError::NotFound(name.to_string()));
        };
        self.nr -= item.cost.nr();
        debug!(cost = name, total_nr = self.nr, "removed cost item");
        Ok(item)
    }

    /// Items in name order
    pub fn costs(&self) -> impl Iterator<Item = (&str, &CostItem)> {
        self.items.iter().map(|(name, item)| (name.as_str(), item))
    }

    pub fn get(&self, name: &str) -> Option<&CostItem> {
        self.items.get(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total residual dimension
    pub fn nr(&self) -> usize {
        self.nr
    }

    pub fn nu(&self) -> usize {
        self.nu
    }

    pub fn state(&self) -> &Arc<StateMultibody> {
        &self.state
    }

    pub fn create_data(&self) -> CostDataSum {
        let ndx = self.state.ndx();
        let nu = self.nu;
        CostDataSum {
            costs: self
                .items
                .iter()
                .map(|(name, item)| (name.clone(), item.cost.create_data()))
                .collect(),
            cost: 0.0,
            r: DVec::zeros(self.nr),
            rx: DMat::zeros(self.nr, ndx),
            ru: DMat::zeros(self.nr, nu),
            lx: DVec::zeros(ndx),
            lu: DVec::zeros(nu),
            lxx: DMat::zeros(ndx, ndx),
            lxu: DMat::zeros(ndx, nu),
            luu: DMat::zeros(nu, nu),
        }
    }

    fn check(&self, data: &CostDataSum, x: &DVec, u: &DVec) -> CostResult<()> {
        check_dim("x", self.state.nx(), x.len())?;
        check_dim("u", self.nu, u.len())?;
        if !data.costs.keys().eq(self.items.keys()) {
            return Err(CostError::DataMismatch(format!(
                "data holds {} items, the sum holds {}",
                data.costs.len(),
                self.items.len()
            )));
        }
        if data.r.len() != self.nr {
            return Err(CostError::DataMismatch(format!(
                "data residual has dimension {}, the sum has nr = {}",
                data.r.len(),
                self.nr
            )));
        }
        Ok(())
    }

    /// Total cost and stacked residual
    pub fn calc(&self, data: &mut CostDataSum, kin: &MultibodyData, x: &DVec, u: &DVec) -> CostResult<()> {
        self.check(data, x, u)?;

        data.cost = 0.0;
        let mut row = 0;
        for (item, item_data) in self.items.values().zip(data.costs.values_mut()) {
            item.cost.calc(item_data, kin, x, u)?;

            let nr = item.cost.nr();
            data.cost += item.weight * item_data.cost;
            data.r.rows_mut(row, nr).copy_from(&(&item_data.r * item.weight.sqrt()));
            row += nr;
        }
        Ok(())
    }

    /// Total cost, stacked residual Jacobians and summed derivatives
    pub fn calc_diff(
        &self,
        data: &mut CostDataSum,
        kin: &MultibodyData,
        x: &DVec,
        u: &DVec,
        recalc: bool,
    ) -> CostResult<()> {
        if recalc {
            self.calc(data, kin, x, u)?;
        } else {
            self.check(data, x, u)?;
        }

        data.lx.fill(0.0);
        data.lu.fill(0.0);
        data.lxx.fill(0.0);
        data.lxu.fill(0.0);
        data.luu.fill(0.0);

        let mut row = 0;
        for (item, item_data) in self.items.values().zip(data.costs.values_mut()) {
            item.cost.calc_diff(item_data, kin, x, u, false)?;

            let (nr, w) = (item.cost.nr(), item.weight);
            let sw = w.sqrt();
            data.rx.rows_mut(row, nr).copy_from(&(&item_data.rx * sw));
            data.ru.rows_mut(row, nr).copy_from(&(&item_data.ru * sw));
            data.lx += &item_data.lx * w;
            data.lu += &item_data.lu * w;
            data.lxx += &item_data.lxx * w;
            data.lxu += &item_data.lxu * w;
            data.luu += &item_data.luu * w;
            row += nr;
        }
        Ok(())
    }

    /// [`CostModelSum::calc`] with a zero control
    pub fn calc_terminal(&self, data: &mut CostDataSum, kin: &MultibodyData, x: &DVec) -> CostResult<()> {
        self.calc(data, kin, x, &DVec::zeros(self.nu))
    }

    /// [`CostModelSum::calc_diff`] with a zero control
    pub fn calc_diff_terminal(
        &self,
        data: &mut CostDataSum,
        kin: &MultibodyData,
        x: &DVec,
        recalc: bool,
    ) -> CostResult<()> {
        self.calc_diff(data, kin, x, &DVec::zeros(self.nu), recalc)
    }
}
