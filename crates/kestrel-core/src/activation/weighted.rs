//! Weighted quadratic activation: a(r) = ½ rᵀ W r

use super::{ActivationData, ActivationModel};
use crate::error::{ModelError, ModelResult};
use crate::{DMat, DVec};

/// Weighted quadratic activation with diagonal weights `W = diag(w)`
///
/// ```text
/// a(r) = ½ Σ wᵢ rᵢ²      Ar = W r      Arr = W
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationWeightedQuad {
    weights: DVec,
}

impl ActivationWeightedQuad {
    /// Weights must be finite and non-negative
    pub fn new(weights: DVec) -> ModelResult<Self> {
        if let Some(w) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(ModelError::InvalidWeights(format!(
                "weight {w} must be finite and non-negative"
            )));
        }
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &DVec {
        &self.weights
    }
}

impl ActivationModel for ActivationWeightedQuad {
    fn nr(&self) -> usize {
        self.weights.len()
    }

    fn calc(&self, data: &mut ActivationData, r: &DVec) {
        debug_assert_eq!(r.len(), self.nr(), "r has wrong dimension");
        data.a_value = 0.5 * r.dot(&self.weights.component_mul(r));
    }

    fn calc_diff(&self, data: &mut ActivationData, r: &DVec, recalc: bool) {
        if recalc {
            self.calc(data, r);
        }
        data.ar = self.weights.component_mul(r);
    }

    fn create_data(&self) -> ActivationData {
        let mut data = ActivationData::new(self.nr());
        data.arr = DMat::from_diagonal(&self.weights);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_weighted_quadratic() {
        let act = ActivationWeightedQuad::new(DVec::from_vec(vec![2.0, 0.5])).unwrap();
        let mut data = act.create_data();
        let r = DVec::from_vec(vec![1.0, 4.0]);

        act.calc_diff(&mut data, &r, true);

        // ½ (2·1 + 0.5·16) = 5
        assert_relative_eq!(data.a_value, 5.0, epsilon = 1e-12);
        assert_eq!(data.ar, DVec::from_vec(vec![2.0, 2.0]));
        assert_eq!(data.arr[(0, 0)], 2.0);
        assert_eq!(data.arr[(1, 1)], 0.5);
        assert_eq!(data.arr[(0, 1)], 0.0);
    }

    #[test]
    fn test_unit_weights_match_quadratic() {
        use crate::activation::ActivationQuad;

        let weighted = ActivationWeightedQuad::new(DVec::from_element(3, 1.0)).unwrap();
        let quad = ActivationQuad::new(3);
        let r = DVec::from_vec(vec![0.3, -0.7, 1.1]);

        let mut dw = weighted.create_data();
        let mut dq = quad.create_data();
        weighted.calc_diff(&mut dw, &r, true);
        quad.calc_diff(&mut dq, &r, true);

        assert_relative_eq!(dw.a_value, dq.a_value, epsilon = 1e-12);
        assert_relative_eq!(dw.ar, dq.ar, epsilon = 1e-12);
        assert_relative_eq!(dw.arr, dq.arr, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_weights() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = ActivationWeightedQuad::new(DVec::from_vec(vec![1.0, bad])).unwrap_err();
            assert!(matches!(err, ModelError::InvalidWeights(_)));
        }
        // Zero switches a component off and is allowed
        assert!(ActivationWeightedQuad::new(DVec::from_vec(vec![0.0, 1.0])).is_ok());
    }
}
