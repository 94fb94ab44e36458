//! Multibody model topology
//!
//! A [`Model`] describes the configuration layout of a kinematic tree: which
//! joints exist, how many configuration (`nq`) and velocity (`nv`)
//! coordinates each contributes, their limits, and the named frames attached
//! to them. It carries no inertial or geometric data; kinematic quantities
//! are supplied through [`MultibodyData`](super::MultibodyData).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::DVec;

/// Joint type, determining its configuration manifold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    /// Rotation about a fixed axis (ℝ)
    Revolute,
    /// Translation along a fixed axis (ℝ)
    Prismatic,
    /// Free rotation, stored as a quaternion (SO(3))
    Spherical,
    /// Floating base, a rigid transform (SE(3))
    FreeFlyer,
}

impl JointKind {
    /// Number of configuration coordinates
    pub fn nq(&self) -> usize {
        match self {
            JointKind::Revolute | JointKind::Prismatic => 1,
            JointKind::Spherical => 4,
            JointKind::FreeFlyer => 7,
        }
    }

    /// Number of velocity (tangent) coordinates
    pub fn nv(&self) -> usize {
        match self {
            JointKind::Revolute | JointKind::Prismatic => 1,
            JointKind::Spherical => 3,
            JointKind::FreeFlyer => 6,
        }
    }

    /// Default position limits for the Euclidean coordinates of the joint
    fn default_limits(&self) -> (f64, f64) {
        match self {
            JointKind::Revolute => (-std::f64::consts::PI, std::f64::consts::PI),
            _ => (-1.0, 1.0),
        }
    }
}

/// A joint in the kinematic tree
#[derive(Debug, Clone, Serialize)]
pub struct Joint {
    pub name: String,
    pub kind: JointKind,
    /// Parent joint index (`None` for a joint attached to the world)
    pub parent: Option<usize>,
    /// Offset of the joint in the configuration vector
    pub idx_q: usize,
    /// Offset of the joint in the velocity vector
    pub idx_v: usize,
    /// Lower position limit (Euclidean coordinates only)
    pub lower: f64,
    /// Upper position limit (Euclidean coordinates only)
    pub upper: f64,
}

/// A named frame rigidly attached to a joint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub name: String,
    /// Joint the frame moves with
    pub parent: usize,
}

/// Joint as read from a serialized model; offsets are recomputed
#[derive(Debug, Clone, Deserialize)]
struct JointDescription {
    name: String,
    kind: JointKind,
    #[serde(default)]
    parent: Option<usize>,
    lower: Option<f64>,
    upper: Option<f64>,
}

/// Serialized model, replayed through the validating builders
#[derive(Debug, Clone, Deserialize)]
struct ModelDescription {
    joints: Vec<JointDescription>,
    #[serde(default)]
    frames: Vec<Frame>,
}

/// Topology of a multibody system
///
/// Deserialization replays the joints and frames through
/// [`Model::add_joint_with_limits`] and [`Model::add_frame`], so a loaded
/// model satisfies the same checks as a built one. Stored offsets and
/// dimensions are ignored and recomputed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "ModelDescription")]
pub struct Model {
    joints: Vec<Joint>,
    frames: Vec<Frame>,
    nq: usize,
    nv: usize,
}

impl Model {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration dimension
    pub fn nq(&self) -> usize {
        self.nq
    }

    /// Velocity dimension
    pub fn nv(&self) -> usize {
        self.nv
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Add a joint with the default limits of its kind
    ///
    /// A frame carrying the joint name is attached to it, so every joint can
    /// be addressed through [`Model::frame_id`].
    pub fn add_joint(&mut self, name: &str, kind: JointKind, parent: Option<usize>) -> ModelResult<usize> {
        let (lower, upper) = kind.default_limits();
        self.add_joint_with_limits(name, kind, parent, lower, upper)
    }

    /// Add a joint with explicit position limits
    pub fn add_joint_with_limits(
        &mut self,
        name: &str,
        kind: JointKind,
        parent: Option<usize>,
        lower: f64,
        upper: f64,
    ) -> ModelResult<usize> {
        if self.joint_id(name).is_some() || self.frame_id(name).is_some() {
            return Err(ModelError::DuplicateName(name.to_string()));
        }
        if let Some(p) = parent {
            if p >= self.joints.len() {
                return Err(ModelError::UnknownJoint(format!("#{p}")));
            }
        }
        if !(lower.is_finite() && upper.is_finite() && lower <= upper) {
            return Err(ModelError::InvalidLimits {
                joint: name.to_string(),
                lower,
                upper,
            });
        }

        let id = self.joints.len();
        self.joints.push(Joint {
            name: name.to_string(),
            kind,
            parent,
            idx_q: self.nq,
            idx_v: self.nv,
            lower,
            upper,
        });
        self.nq += kind.nq();
        self.nv += kind.nv();
        self.frames.push(Frame {
            name: name.to_string(),
            parent: id,
        });

        debug!(joint = name, ?kind, nq = self.nq, nv = self.nv, "added joint");
        Ok(id)
    }

    /// Attach an additional operational frame to a joint
    pub fn add_frame(&mut self, name: &str, joint: usize) -> ModelResult<usize> {
        if joint >= self.joints.len() {
            return Err(ModelError::UnknownJoint(format!("#{joint}")));
        }
        if self.frame_id(name).is_some() {
            return Err(ModelError::DuplicateName(name.to_string()));
        }
        self.frames.push(Frame {
            name: name.to_string(),
            parent: joint,
        });
        Ok(self.frames.len() - 1)
    }

    /// Look up a joint index by name
    pub fn joint_id(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// Look up a frame index by name
    pub fn frame_id(&self, name: &str) -> Option<usize> {
        self.frames.iter().position(|f| f.name == name)
    }

    /// Neutral configuration: zero Euclidean coordinates, identity rotations
    pub fn neutral(&self) -> DVec {
        let mut q = DVec::zeros(self.nq);
        for joint in &self.joints {
            match joint.kind {
                JointKind::Revolute | JointKind::Prismatic => {}
                // Quaternions are stored (x, y, z, w)
                JointKind::Spherical => q[joint.idx_q + 3] = 1.0,
                JointKind::FreeFlyer => q[joint.idx_q + 6] = 1.0,
            }
        }
        q
    }

    fn add_described_joint(&mut self, joint: &JointDescription) -> ModelResult<usize> {
        let (default_lower, default_upper) = joint.kind.default_limits();
        self.add_joint_with_limits(
            &joint.name,
            joint.kind,
            joint.parent,
            joint.lower.unwrap_or(default_lower),
            joint.upper.unwrap_or(default_upper),
        )
    }

    /// Sample humanoid topology
    ///
    /// Floating base, two 6-DoF legs, a 2-DoF chest, two 7-DoF arms and a
    /// 2-DoF head: `nq = 37`, `nv = 36`. Joints are named `root_joint`,
    /// `lleg1_joint` … `lleg6_joint`, `rleg1_joint` … `rleg6_joint`,
    /// `chest1_joint`, `chest2_joint`, `larm1_joint` … `larm7_joint`,
    /// `rarm1_joint` … `rarm7_joint`, `head1_joint` and `head2_joint`.
    pub fn sample_humanoid() -> ModelResult<Self> {
        let mut model = Model::new();
        let root = model.add_joint("root_joint", JointKind::FreeFlyer, None)?;

        model.add_chain("lleg", 6, root)?;
        model.add_chain("rleg", 6, root)?;
        let chest = model.add_chain("chest", 2, root)?;
        model.add_chain("larm", 7, chest)?;
        model.add_chain("rarm", 7, chest)?;
        model.add_chain("head", 2, chest)?;
        Ok(model)
    }

    /// Add a serial chain of revolute joints, returning the last joint
    fn add_chain(&mut self, prefix: &str, length: usize, parent: usize) -> ModelResult<usize> {
        let mut last = parent;
        for k in 1..=length {
            last = self.add_joint(&format!("{prefix}{k}_joint"), JointKind::Revolute, Some(last))?;
        }
        Ok(last)
    }
}

impl TryFrom<ModelDescription> for Model {
    type Error = ModelError;

    fn try_from(desc: ModelDescription) -> ModelResult<Self> {
        let mut model = Model::new();
        let mut joints = desc.joints.iter().peekable();

        // Frames are listed in creation order; a joint frame marks where its
        // joint was added
        for frame in &desc.frames {
            let next = model.joints.len();
            match joints.peek() {
                Some(joint) if frame.parent == next && frame.name == joint.name => {
                    model.add_described_joint(joint)?;
                    joints.next();
                }
                _ => {
                    model.add_frame(&frame.name, frame.parent)?;
                }
            }
        }
        for joint in joints {
            model.add_described_joint(joint)?;
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_dimensions() {
        assert_eq!((JointKind::Revolute.nq(), JointKind::Revolute.nv()), (1, 1));
        assert_eq!((JointKind::Spherical.nq(), JointKind::Spherical.nv()), (4, 3));
        assert_eq!((JointKind::FreeFlyer.nq(), JointKind::FreeFlyer.nv()), (7, 6));
    }

    #[test]
    fn test_sample_humanoid_dimensions() {
        let model = Model::sample_humanoid().unwrap();
        assert_eq!(model.nq(), 37);
        assert_eq!(model.nv(), 36);
        assert_eq!(model.joints().len(), 31);
        assert!(model.frame_id("rleg5_joint").is_some());
        assert!(model.frame_id("rleg7_joint").is_none());
    }

    #[test]
    fn test_offsets_are_contiguous() {
        let model = Model::sample_humanoid().unwrap();
        let mut iq = 0;
        let mut iv = 0;
        for joint in model.joints() {
            assert_eq!(joint.idx_q, iq);
            assert_eq!(joint.idx_v, iv);
            iq += joint.kind.nq();
            iv += joint.kind.nv();
        }
        assert_eq!(iq, model.nq());
        assert_eq!(iv, model.nv());
    }

    #[test]
    fn test_neutral_configuration() {
        let mut model = Model::new();
        let base = model.add_joint("base", JointKind::FreeFlyer, None).unwrap();
        let ball = model.add_joint("ball", JointKind::Spherical, Some(base)).unwrap();
        model.add_joint("elbow", JointKind::Revolute, Some(ball)).unwrap();

        let q = model.neutral();
        assert_eq!(q.len(), 12);
        assert_eq!(q[6], 1.0);
        assert_eq!(q[10], 1.0);
        assert_eq!(q.iter().filter(|&&c| c != 0.0).count(), 2);
    }

    #[test]
    fn test_duplicate_and_unknown() {
        let mut model = Model::new();
        let j = model.add_joint("hip", JointKind::Revolute, None).unwrap();
        assert_eq!(
            model.add_joint("hip", JointKind::Revolute, None),
            Err(ModelError::DuplicateName("hip".into()))
        );
        assert!(matches!(
            model.add_joint("knee", JointKind::Revolute, Some(5)),
            Err(ModelError::UnknownJoint(_))
        ));
        assert!(matches!(model.add_frame("foot", 3), Err(ModelError::UnknownJoint(_))));

        let f = model.add_frame("foot", j).unwrap();
        assert_eq!(model.frame_id("foot"), Some(f));
        assert_eq!(model.frames()[f].parent, j);
    }

    #[test]
    fn test_invalid_limits() {
        let mut model = Model::new();
        let err = model
            .add_joint_with_limits("slider", JointKind::Prismatic, None, 1.0, -1.0)
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidLimits { .. }));
    }

    #[test]
    fn test_non_finite_limits() {
        let mut model = Model::new();
        for (lower, upper) in [
            (f64::NEG_INFINITY, f64::INFINITY),
            (0.0, f64::INFINITY),
            (f64::NAN, 1.0),
        ] {
            let err = model
                .add_joint_with_limits("slider", JointKind::Prismatic, None, lower, upper)
                .unwrap_err();
            assert!(matches!(err, ModelError::InvalidLimits { .. }));
        }
        assert_eq!(model.nq(), 0);
        assert!(model.joints().is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let mut model = Model::sample_humanoid().unwrap();
        let chest = model.joint_id("chest2_joint").unwrap();
        model.add_frame("camera", chest).unwrap();
        let hand = model.joint_id("rarm7_joint").unwrap();
        model
            .add_joint_with_limits("gripper", JointKind::Prismatic, Some(hand), 0.0, 0.08)
            .unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let loaded: Model = serde_json::from_str(&json).unwrap();

        assert_eq!((loaded.nq(), loaded.nv()), (model.nq(), model.nv()));
        assert_eq!(loaded.frame_id("camera"), model.frame_id("camera"));
        assert_eq!(loaded.frame_id("gripper"), model.frame_id("gripper"));
        let gripper = &loaded.joints()[loaded.joint_id("gripper").unwrap()];
        assert_eq!((gripper.lower, gripper.upper), (0.0, 0.08));
        assert_eq!(gripper.idx_q, model.nq() - 1);
    }

    #[test]
    fn test_deserialize_recomputes_offsets() {
        let json = r#"{
            "joints": [
                { "name": "base", "kind": "free_flyer", "idx_q": 40, "idx_v": 40 },
                { "name": "hip", "kind": "revolute", "parent": 0, "lower": -1.0, "upper": 1.0 }
            ],
            "nq": 2,
            "nv": 2
        }"#;
        let model: Model = serde_json::from_str(json).unwrap();
        assert_eq!((model.nq(), model.nv()), (8, 7));
        assert_eq!(model.joints()[1].idx_q, 7);
        assert_eq!(model.frame_id("hip"), Some(1));
    }

    #[test]
    fn test_deserialize_validates() {
        // Inverted limits
        let json = r#"{ "joints": [
            { "name": "hip", "kind": "revolute", "lower": 1.0, "upper": -1.0 }
        ] }"#;
        let err = serde_json::from_str::<Model>(json).unwrap_err();
        assert!(err.to_string().contains("Invalid limits"));

        // Parent declared after its child
        let json = r#"{ "joints": [
            { "name": "knee", "kind": "revolute", "parent": 1 },
            { "name": "hip", "kind": "revolute" }
        ] }"#;
        assert!(serde_json::from_str::<Model>(json).is_err());

        // Duplicate names
        let json = r#"{ "joints": [
            { "name": "hip", "kind": "revolute" },
            { "name": "hip", "kind": "prismatic" }
        ] }"#;
        assert!(serde_json::from_str::<Model>(json).is_err());
    }
}
