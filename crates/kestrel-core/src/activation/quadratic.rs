//! Quadratic activation: a(r) = ½‖r‖²

use super::{ActivationData, ActivationModel};
use crate::{DMat, DVec};

/// Quadratic activation
///
/// ```text
/// a(r) = ½ rᵀr      Ar = r      Arr = I
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationQuad {
    nr: usize,
}

impl ActivationQuad {
    pub fn new(nr: usize) -> Self {
        Self { nr }
    }
}

impl ActivationModel for ActivationQuad {
    fn nr(&self) -> usize {
        self.nr
    }

    fn calc(&self, data: &mut ActivationData, r: &DVec) {
        debug_assert_eq!(r.len(), self.nr, "r has wrong dimension");
        data.a_value = 0.5 * r.norm_squared();
    }

    fn calc_diff(&self, data: &mut ActivationData, r: &DVec, recalc: bool) {
        if recalc {
            self.calc(data, r);
        }
        data.ar.copy_from(r);
    }

    fn create_data(&self) -> ActivationData {
        // Arr is constant
        let mut data = ActivationData::new(self.nr);
        data.arr = DMat::identity(self.nr, self.nr);
        data
    }
}
