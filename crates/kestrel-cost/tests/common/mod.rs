//! Shared test support
//!
//! - Derived costs: every cost rewritten from its textbook formula, used as
//!   an independent reference for the library implementations.
//! - `FreeFlyerKinematics`: a rigid body with fixed frames, whose kinematics
//!   are consistent with the state, for finite-difference checks.

#![allow(dead_code)]

use std::sync::Arc;

use nalgebra::{Isometry3, Matrix3, Matrix6, Translation3, UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kestrel_core::multibody::{FrameKinematics, JointKind, KinematicsUpdate, Model, MultibodyData};
use kestrel_core::state::{State, StateMultibody};
use kestrel_core::{DMat, DVec, ModelResult, Motion};
use kestrel_cost::CostData;

pub const HUMANOID_FRAME: &str = "rleg5_joint";

/// Humanoid state, random state/control and a random kinematic snapshot
pub struct HumanoidFixture {
    pub model: Arc<Model>,
    pub state: Arc<StateMultibody>,
    pub kin: MultibodyData,
    pub x: DVec,
    pub u: DVec,
    pub rng: StdRng,
}

impl HumanoidFixture {
    pub fn new(seed: u64) -> Self {
        let model = Arc::new(Model::sample_humanoid().unwrap());
        let state = Arc::new(StateMultibody::new(model.clone()));
        let mut rng = StdRng::seed_from_u64(seed);
        let kin = MultibodyData::random(&model, &mut rng);
        let x = state.rand(&mut rng);
        let u = DVec::from_fn(state.nv(), |_, _| rng.gen_range(-1.0..1.0));
        Self {
            model,
            state,
            kin,
            x,
            u,
            rng,
        }
    }

    pub fn frame(&self) -> usize {
        self.model.frame_id(HUMANOID_FRAME).unwrap()
    }
}

fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Inverse right Jacobian of SO(3), closed form
pub fn inv_right_jacobian(w: &Vector3<f64>) -> Matrix3<f64> {
    let theta = w.norm();
    let s = skew(w);
    let coeff = if theta < 1e-5 {
        1.0 / 12.0
    } else {
        1.0 / (theta * theta) - (1.0 + theta.cos()) / (2.0 * theta * theta.sin())
    };
    Matrix3::identity() + 0.5 * s + coeff * s * s
}

/// `[ρ^ φ^; 0 φ^]`, the cross-product matrix of a motion `[ρ; φ]`
fn motion_cross(nu: &Motion) -> Matrix6<f64> {
    let rho = skew(&nu.fixed_rows::<3>(0).into_owned());
    let phi = skew(&nu.fixed_rows::<3>(3).into_owned());
    let mut ad = Matrix6::zeros();
    ad.fixed_view_mut::<3, 3>(0, 0).copy_from(&phi);
    ad.fixed_view_mut::<3, 3>(3, 3).copy_from(&phi);
    ad.fixed_view_mut::<3, 3>(0, 3).copy_from(&rho);
    ad
}

/// Right Jacobian of SE(3) summed as Σ (-ad ν)ᵏ / (k+1)!
pub fn right_jacobian6(nu: &Motion) -> Matrix6<f64> {
    let minus_ad = -motion_cross(nu);
    let mut term = Matrix6::identity();
    let mut sum = Matrix6::identity();
    for k in 1..40 {
        term = term * minus_ad / (k as f64 + 1.0);
        sum += term;
    }
    sum
}

/// Inverse right Jacobian of SE(3), by inverting the series
pub fn inv_right_jacobian6(nu: &Motion) -> Matrix6<f64> {
    right_jacobian6(nu).try_inverse().unwrap()
}

/// SE(3) logarithm with the translation solved through the series of V(φ)
pub fn log_se3(m: &Isometry3<f64>) -> Motion {
    let phi = m.rotation.scaled_axis();
    let hat = skew(&phi);
    let mut term = Matrix3::identity();
    let mut v = Matrix3::identity();
    for k in 1..40 {
        term = term * hat / (k as f64 + 1.0);
        v += term;
    }
    let rho = v.try_inverse().unwrap() * m.translation.vector;
    Motion::new(rho.x, rho.y, rho.z, phi.x, phi.y, phi.z)
}

/// Quadratic-activation results of a derived cost
pub struct Derived {
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

impl Derived {
    pub fn from_residual(r: DVec, rx: DMat, ru: DMat) -> Self {
        Self {
            cost: 0.5 * r.dot(&r),
            lx: rx.transpose() * &r,
            lu: ru.transpose() * &r,
            lxx: rx.transpose() * &rx,
            lxu: rx.transpose() * &ru,
            luu: ru.transpose() * &ru,
            r,
            rx,
            ru,
        }
    }

    /// Assert that library data matches this reference
    pub fn assert_matches(&self, data: &CostData, derivatives: bool) {
        approx::assert_relative_eq!(data.cost, self.cost, epsilon = 1e-10);
        approx::assert_relative_eq!(data.r, self.r, epsilon = 1e-9);
        if derivatives {
            approx::assert_relative_eq!(data.lx, self.lx, epsilon = 1e-9);
            approx::assert_relative_eq!(data.lu, self.lu, epsilon = 1e-9);
            approx::assert_relative_eq!(data.lxx, self.lxx, epsilon = 1e-9);
            approx::assert_relative_eq!(data.lxu, self.lxu, epsilon = 1e-9);
            approx::assert_relative_eq!(data.luu, self.luu, epsilon = 1e-9);
        }
    }
}

fn quat_at(q: &DVec, i: usize) -> UnitQuaternion<f64> {
    UnitQuaternion::new_normalize(nalgebra::Quaternion::new(q[i + 3], q[i], q[i + 1], q[i + 2]))
}

fn placement_at(q: &DVec, i: usize) -> Isometry3<f64> {
    let p = Vector3::new(q[i], q[i + 1], q[i + 2]);
    Isometry3::from_parts(Translation3::from(p), quat_at(q, i + 3))
}

/// `diff(xref, x)` and its derivative w.r.t. `x`, joint by joint
pub fn derived_state(state: &StateMultibody, xref: &DVec, x: &DVec, nu: usize) -> Derived {
    let model = state.model();
    let (nq, nv) = (model.nq(), model.nv());
    let mut r = DVec::zeros(2 * nv);
    let mut rx = DMat::identity(2 * nv, 2 * nv);

    for joint in model.joints() {
        let (iq, iv) = (joint.idx_q, joint.idx_v);
        match joint.kind {
            JointKind::Revolute | JointKind::Prismatic => r[iv] = x[iq] - xref[iq],
            JointKind::Spherical => {
                let w = (quat_at(xref, iq).inverse() * quat_at(x, iq)).scaled_axis();
                r.fixed_rows_mut::<3>(iv).copy_from(&w);
                rx.fixed_view_mut::<3, 3>(iv, iv).copy_from(&inv_right_jacobian(&w));
            }
            JointKind::FreeFlyer => {
                let d = log_se3(&(placement_at(xref, iq).inverse() * placement_at(x, iq)));
                r.fixed_rows_mut::<6>(iv).copy_from(&d);
                rx.fixed_view_mut::<6, 6>(iv, iv).copy_from(&inv_right_jacobian6(&d));
            }
        }
    }
    for k in 0..nv {
        r[nv + k] = x[nq + k] - xref[nq + k];
    }
    Derived::from_residual(r, rx, DMat::zeros(2 * nv, nu))
}

pub fn derived_control(uref: &DVec, u: &DVec, ndx: usize) -> Derived {
    let nu = u.len();
    Derived::from_residual(u - uref, DMat::zeros(nu, ndx), DMat::identity(nu, nu))
}

pub fn derived_com(kin: &MultibodyData, cref: &Vector3<f64>, nu: usize) -> Derived {
    let nv = kin.nv();
    let r = DVec::from_column_slice((kin.com() - cref).as_slice());
    let mut rx = DMat::zeros(3, 2 * nv);
    rx.view_mut((0, 0), (3, nv)).copy_from(kin.jacobian_com());
    Derived::from_residual(r, rx, DMat::zeros(3, nu))
}

pub fn derived_frame_placement(frame: &FrameKinematics, target: &Isometry3<f64>, nu: usize) -> Derived {
    let nv = frame.jacobian.ncols();
    let error = log_se3(&(target.inverse() * frame.placement));
    let r = DVec::from_column_slice(error.as_slice());

    let mut rx = DMat::zeros(6, 2 * nv);
    rx.view_mut((0, 0), (6, nv))
        .copy_from(&(inv_right_jacobian6(&error) * &frame.jacobian));
    Derived::from_residual(r, rx, DMat::zeros(6, nu))
}

pub fn derived_frame_translation(frame: &FrameKinematics, target: &Vector3<f64>, nu: usize) -> Derived {
    let nv = frame.jacobian.ncols();
    let p = frame.placement.translation.vector;
    let r = DVec::from_column_slice((p - target).as_slice());

    let mut rx = DMat::zeros(3, 2 * nv);
    let rot = frame.placement.rotation.to_rotation_matrix().into_inner();
    rx.view_mut((0, 0), (3, nv)).copy_from(&(rot * frame.jacobian.rows(0, 3)));
    Derived::from_residual(r, rx, DMat::zeros(3, nu))
}

pub fn derived_frame_velocity(frame: &FrameKinematics, target: &Motion, nu: usize) -> Derived {
    let nv = frame.jacobian.ncols();
    let r = DVec::from_column_slice((frame.velocity - target).as_slice());
    let mut rx = DMat::zeros(6, 2 * nv);
    rx.view_mut((0, 0), (6, nv)).copy_from(&frame.dv_dq);
    rx.view_mut((0, nv), (6, nv)).copy_from(&frame.dv_dv);
    Derived::from_residual(r, rx, DMat::zeros(6, nu))
}

/// Single free-flying rigid body carrying fixed frames
///
/// Frame 0 is the body frame; each added frame sits at a fixed offset from
/// it. The centre of mass sits at a fixed point of the body.
pub struct FreeFlyerKinematics {
    offsets: Vec<Isometry3<f64>>,
    com: Vector3<f64>,
}

impl FreeFlyerKinematics {
    /// Model with a free-flyer root, its frame, and a "tool" frame at `offset`
    pub fn new(offset: Isometry3<f64>, com: Vector3<f64>) -> (Arc<Model>, Self) {
        let mut model = Model::new();
        let root = model.add_joint("root", JointKind::FreeFlyer, None).unwrap();
        model.add_frame("tool", root).unwrap();
        let offsets = vec![Isometry3::identity(), offset];
        (Arc::new(model), Self { offsets, com })
    }

    pub fn sample() -> (Arc<Model>, Self) {
        let offset = Isometry3::from_parts(
            Translation3::new(0.1, -0.2, 0.35),
            UnitQuaternion::from_euler_angles(0.3, -0.5, 0.8),
        );
        Self::new(offset, Vector3::new(0.02, 0.01, -0.05))
    }
}

impl KinematicsUpdate for FreeFlyerKinematics {
    fn update(&self, _model: &Model, data: &mut MultibodyData, q: &DVec, v: &DVec) -> ModelResult<()> {
        let base = placement_at(q, 0);
        let r_mat = base.rotation.to_rotation_matrix().into_inner();
        // Base velocity is local: [v; ω] in body axes
        let base_vel = Motion::from_column_slice(v.rows(0, 6).as_slice());

        for (id, offset) in self.offsets.iter().enumerate() {
            let o = offset.translation.vector;
            let rf_t = offset.rotation.to_rotation_matrix().into_inner().transpose();

            // Ad(offset⁻¹)
            let mut ad_inv = Matrix6::zeros();
            ad_inv.fixed_view_mut::<3, 3>(0, 0).copy_from(&rf_t);
            ad_inv.fixed_view_mut::<3, 3>(0, 3).copy_from(&(-rf_t * skew(&o)));
            ad_inv.fixed_view_mut::<3, 3>(3, 3).copy_from(&rf_t);
            let jacobian = DMat::from_column_slice(6, 6, ad_inv.as_slice());

            data.set_frame(
                id,
                FrameKinematics {
                    placement: base * offset,
                    velocity: ad_inv * base_vel,
                    dv_dq: DMat::zeros(6, 6),
                    dv_dv: jacobian.clone(),
                    jacobian,
                },
            )?;
        }

        let mut jacobian_com = DMat::zeros(3, 6);
        jacobian_com.view_mut((0, 0), (3, 3)).copy_from(&r_mat);
        jacobian_com.view_mut((0, 3), (3, 3)).copy_from(&(-r_mat * skew(&self.com)));
        data.set_com((base * nalgebra::Point3::from(self.com)).coords, jacobian_com)
    }
}

/// Free-flyer state, a kinematics fixture, and a consistent snapshot
pub struct FreeFlyerFixture {
    pub model: Arc<Model>,
    pub state: Arc<StateMultibody>,
    pub kinematics: Arc<FreeFlyerKinematics>,
    pub kin: MultibodyData,
    pub x: DVec,
    pub u: DVec,
}

impl FreeFlyerFixture {
    pub fn new(seed: u64) -> Self {
        let (model, kinematics) = FreeFlyerKinematics::sample();
        let state = Arc::new(StateMultibody::new(model.clone()));
        let mut rng = StdRng::seed_from_u64(seed);
        let x = state.rand(&mut rng);
        let u = DVec::from_fn(6, |_, _| rng.gen_range(-1.0..1.0));

        let mut kin = MultibodyData::new(&model);
        let (q, v) = state.split(&x).unwrap();
        kinematics.update(&model, &mut kin, &q, &v).unwrap();

        Self {
            model,
            state,
            kinematics: Arc::new(kinematics),
            kin,
            x,
            u,
        }
    }

    pub fn tool(&self) -> usize {
        self.model.frame_id("tool").unwrap()
    }
}
