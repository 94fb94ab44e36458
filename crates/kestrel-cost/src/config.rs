//! Cost set configuration
//!
//! A cost set is described in JSON and turned into a [`CostModelSum`]:
//!
//! ```json
//! {
//!   "costs": [
//!     { "name": "xReg", "weight": 1e-2, "residual": { "type": "state" } },
//!     { "name": "uReg", "weight": 1e-4, "residual": { "type": "control" } },
//!     {
//!       "name": "footTrack",
//!       "weight": 10.0,
//!       "activation": { "type": "weighted_quadratic", "weights": [1, 1, 1] },
//!       "residual": { "type": "frame_translation", "frame": "rleg5_joint", "reference": [0.1, -0.1, 0.0] }
//!     }
//!   ]
//! }
//! ```

use std::sync::Arc;

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use tracing::debug;

use kestrel_core::activation::{
    ActivationBounds, ActivationModel, ActivationQuad, ActivationQuadBarrier, ActivationWeightedQuad,
};
use kestrel_core::state::{State, StateMultibody};
use kestrel_core::{DVec, Motion, Vec3};

use crate::cost::CostModel;
use crate::costs::{
    CostComPosition, CostControl, CostFramePlacement, CostFrameTranslation, CostFrameVelocity, CostState,
    FrameMotion, FramePlacement, FrameTranslation,
};
use crate::error::{check_dim, CostError, CostResult};
use crate::sum::CostModelSum;

/// A set of named, weighted costs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSetConfig {
    /// Control dimension of the sum (defaults to `nv`)
    #[serde(default)]
    pub nu: Option<usize>,
    pub costs: Vec<CostEntry>,
}

/// One cost of the set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEntry {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub activation: ActivationConfig,
    pub residual: ResidualConfig,
}

fn default_weight() -> f64 {
    1.0
}

/// Activation applied to a residual
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivationConfig {
    #[default]
    Quadratic,
    WeightedQuadratic { weights: Vec<f64> },
    QuadraticBarrier {
        lower: Vec<f64>,
        upper: Vec<f64>,
        #[serde(default = "default_beta")]
        beta: f64,
    },
}

fn default_beta() -> f64 {
    1.0
}

/// Residual of a cost; frames are referenced by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResidualConfig {
    State {
        #[serde(default)]
        reference: Option<Vec<f64>>,
    },
    Control {
        #[serde(default)]
        reference: Option<Vec<f64>>,
    },
    ComPosition {
        reference: [f64; 3],
    },
    FramePlacement {
        frame: String,
        translation: [f64; 3],
        /// Unit quaternion `(x, y, z, w)`
        rotation: [f64; 4],
    },
    FrameTranslation {
        frame: String,
        reference: [f64; 3],
    },
    FrameVelocity {
        frame: String,
        #[serde(default)]
        linear: [f64; 3],
        #[serde(default)]
        angular: [f64; 3],
    },
}

impl ResidualConfig {
    /// Residual dimension, given the state
    fn nr(&self, state: &StateMultibody, nu: usize) -> usize {
        match self {
            ResidualConfig::State { .. } => state.ndx(),
            ResidualConfig::Control { reference } => reference.as_ref().map_or(nu, Vec::len),
            ResidualConfig::ComPosition { .. } | ResidualConfig::FrameTranslation { .. } => 3,
            ResidualConfig::FramePlacement { .. } | ResidualConfig::FrameVelocity { .. } => 6,
        }
    }
}

impl ActivationConfig {
    fn build(&self, nr: usize) -> CostResult<Arc<dyn ActivationModel>> {
        Ok(match self {
            ActivationConfig::Quadratic => Arc::new(ActivationQuad::new(nr)),
            ActivationConfig::WeightedQuadratic { weights } => {
                Arc::new(ActivationWeightedQuad::new(DVec::from_column_slice(weights))?)
            }
            ActivationConfig::QuadraticBarrier { lower, upper, beta } => {
                let bounds = ActivationBounds::new(
                    DVec::from_column_slice(lower),
                    DVec::from_column_slice(upper),
                    *beta,
                )?;
                Arc::new(ActivationQuadBarrier::new(bounds))
            }
        })
    }
}

fn frame_id(state: &StateMultibody, name: &str) -> CostResult<usize> {
    state
        .model()
        .frame_id(name)
        .ok_or_else(|| CostError::UnknownFrame(name.to_string()))
}

fn unit_quaternion(xyzw: &[f64; 4]) -> CostResult<UnitQuaternion<f64>> {
    let [x, y, z, w] = *xyzw;
    let q = Quaternion::new(w, x, y, z);
    if !(q.norm() > 1e-9) {
        return Err(CostError::Config(format!("rotation {xyzw:?} is not a valid quaternion")));
    }
    Ok(UnitQuaternion::from_quaternion(q))
}

impl CostEntry {
    fn build(&self, state: &Arc<StateMultibody>, nu: usize) -> CostResult<Arc<dyn CostModel>> {
        let activation = self.activation.build(self.residual.nr(state, nu))?;
        let state = state.clone();

        Ok(match &self.residual {
            ResidualConfig::State { reference } => {
                let xref = match reference {
                    Some(values) => DVec::from_column_slice(values),
                    None => state.zero(),
                };
                Arc::new(CostState::with_activation(state, activation, xref, nu)?)
            }
            ResidualConfig::Control { reference } => {
                let uref = match reference {
                    Some(values) => {
                        check_dim("control reference", nu, values.len())?;
                        DVec::from_column_slice(values)
                    }
                    None => DVec::zeros(nu),
                };
                Arc::new(CostControl::with_activation(state, activation, uref)?)
            }
            ResidualConfig::ComPosition { reference } => {
                let cref = Vec3::from(*reference);
                Arc::new(CostComPosition::with_activation(state, activation, cref, nu)?)
            }
            ResidualConfig::FramePlacement {
                frame,
                translation,
                rotation,
            } => {
                let reference = FramePlacement {
                    frame: frame_id(&state, frame)?,
                    placement: Isometry3::from_parts(
                        Translation3::from(Vec3::from(*translation)),
                        unit_quaternion(rotation)?,
                    ),
                };
                Arc::new(CostFramePlacement::with_activation(state, activation, reference, nu)?)
            }
            ResidualConfig::FrameTranslation { frame, reference } => {
                let reference = FrameTranslation {
                    frame: frame_id(&state, frame)?,
                    translation: Vec3::from(*reference),
                };
                Arc::new(CostFrameTranslation::with_activation(state, activation, reference, nu)?)
            }
            ResidualConfig::FrameVelocity { frame, linear, angular } => {
                let reference = FrameMotion {
                    frame: frame_id(&state, frame)?,
                    motion: Motion::new(linear[0], linear[1], linear[2], angular[0], angular[1], angular[2]),
                };
                Arc::new(CostFrameVelocity::with_activation(state, activation, reference, nu)?)
            }
        })
    }
}

impl CostSetConfig {
    pub fn from_json(json: &str) -> CostResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> CostResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the cost sum described by this configuration
    pub fn build(&self, state: &Arc<StateMultibody>) -> CostResult<CostModelSum> {
        let nu = self.nu.unwrap_or_else(|| state.nv());
        let mut sum = CostModelSum::new(state.clone(), nu);
        for entry in &self.costs {
            let cost = entry.build(state, nu)?;
            sum.add_cost(&entry.name, cost, entry.weight)?;
        }
        debug!(costs = sum.len(), nu, nr = sum.nr(), "built cost sum from configuration");
        Ok(sum)
    }
}
