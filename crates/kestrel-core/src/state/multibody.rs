//! Multibody state `x = [q; v]`
//!
//! The configuration manifold is the product of the joint manifolds of the
//! model; the velocity is Euclidean. The tangent vector is `[dq; dv]` with
//! `dq ∈ ℝⁿᵛ`, so `ndx = 2·nv`.
//!
//! Per-joint operations (quaternions stored `(x, y, z, w)`):
//!
//! ```text
//! ℝ     : diff = q1 - q0              integrate = q + δ
//! SO(3) : diff = log3(q0⁻¹ q1)        integrate = q · exp3(δ)
//! SE(3) : diff = log6(M0⁻¹ M1)        integrate = M · exp6(δ)
//! ```
//!
//! A free-flyer stores `[p; quat]` and its tangent is the local spatial
//! velocity `[v; ω]`.

use std::sync::Arc;

use nalgebra::{Isometry3, Matrix6, Quaternion, Translation3, UnitQuaternion, Vector3};
use rand::{Rng, RngCore};

use super::{Jacobians, Jcomponent, State};
use crate::error::{check_dim, ModelResult};
use crate::math::{
    adjoint, exp3, exp6, jexp3, jexp6, jlog3, jlog6, log3, log6, random_rotation, rotation_matrix,
};
use crate::multibody::{JointKind, Model};
use crate::{DMat, DVec, Mat3, Motion};

/// State of a multibody system described by a [`Model`]
#[derive(Debug, Clone)]
pub struct StateMultibody {
    model: Arc<Model>,
}

/// Read a unit quaternion stored as `(x, y, z, w)` at offset `i`
fn read_quat(q: &DVec, i: usize) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[i + 3], q[i], q[i + 1], q[i + 2]))
}

/// Write a unit quaternion as `(x, y, z, w)` at offset `i`
fn write_quat(q: &mut DVec, i: usize, quat: &UnitQuaternion<f64>) {
    q.rows_mut(i, 4).copy_from(&quat.coords);
}

fn read_vec3(v: &DVec, i: usize) -> Vector3<f64> {
    Vector3::new(v[i], v[i + 1], v[i + 2])
}

fn read_motion(v: &DVec, i: usize) -> Motion {
    v.fixed_rows::<6>(i).into_owned()
}

/// Read a free-flyer placement stored as `[p; quat]` at offset `i`
fn read_placement(q: &DVec, i: usize) -> Isometry3<f64> {
    Isometry3::from_parts(Translation3::from(read_vec3(q, i)), read_quat(q, i + 3))
}

fn write_placement(q: &mut DVec, i: usize, m: &Isometry3<f64>) {
    q.fixed_rows_mut::<3>(i).copy_from(&m.translation.vector);
    write_quat(q, i + 3, &m.rotation);
}

/// Tangent block of a joint living on a Lie group
enum GroupBlock {
    So3(usize, Vector3<f64>),
    Se3(usize, Motion),
}

impl StateMultibody {
    pub fn new(model: Arc<Model>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Split a state into configuration and velocity
    pub fn split(&self, x: &DVec) -> ModelResult<(DVec, DVec)> {
        check_dim("x", self.nx(), x.len())?;
        let nq = self.model.nq();
        Ok((x.rows(0, nq).into_owned(), x.rows(nq, self.model.nv()).into_owned()))
    }

    fn check_x(&self, x: &DVec) -> ModelResult<()> {
        check_dim("x", self.nx(), x.len())
    }

    fn check_dx(&self, dx: &DVec) -> ModelResult<()> {
        check_dim("dx", self.ndx(), dx.len())
    }

    /// Configuration difference, writing `dq` into `out[0..nv]`
    fn difference(&self, q0: &DVec, q1: &DVec, out: &mut DVec) {
        for joint in self.model.joints() {
            let (iq, iv) = (joint.idx_q, joint.idx_v);
            match joint.kind {
                JointKind::Revolute | JointKind::Prismatic => out[iv] = q1[iq] - q0[iq],
                JointKind::Spherical => {
                    let d = log3(&(read_quat(q0, iq).inverse() * read_quat(q1, iq)));
                    out.rows_mut(iv, 3).copy_from(&d);
                }
                JointKind::FreeFlyer => {
                    let d = log6(&(read_placement(q0, iq).inverse() * read_placement(q1, iq)));
                    out.fixed_rows_mut::<6>(iv).copy_from(&d);
                }
            }
        }
    }

    /// Configuration increment, writing the result into `out[0..nq]`
    fn increment(&self, q: &DVec, dq: &DVec, out: &mut DVec) {
        for joint in self.model.joints() {
            let (iq, iv) = (joint.idx_q, joint.idx_v);
            match joint.kind {
                JointKind::Revolute | JointKind::Prismatic => out[iq] = q[iq] + dq[iv],
                JointKind::Spherical => {
                    let r = read_quat(q, iq) * exp3(&read_vec3(dq, iv));
                    write_quat(out, iq, &r);
                }
                JointKind::FreeFlyer => {
                    let m = read_placement(q, iq) * exp6(&read_motion(dq, iv));
                    write_placement(out, iq, &m);
                }
            }
        }
    }

    /// Lie-group blocks `(offset in v, tangent)` of a tangent vector
    fn group_blocks<'a>(&'a self, dq: &'a DVec) -> impl Iterator<Item = GroupBlock> + 'a {
        self.model.joints().iter().filter_map(move |joint| match joint.kind {
            JointKind::Spherical => Some(GroupBlock::So3(joint.idx_v, read_vec3(dq, joint.idx_v))),
            JointKind::FreeFlyer => Some(GroupBlock::Se3(joint.idx_v, read_motion(dq, joint.idx_v))),
            _ => None,
        })
    }

    /// Jacobian with `sign · I` everywhere except on the SO(3) and SE(3) blocks
    fn block_jacobian<F3, F6>(&self, dq: &DVec, sign: f64, so3_block: F3, se3_block: F6) -> DMat
    where
        F3: Fn(&Vector3<f64>) -> Mat3,
        F6: Fn(&Motion) -> Matrix6<f64>,
    {
        let ndx = self.ndx();
        let mut jac = DMat::identity(ndx, ndx) * sign;
        for block in self.group_blocks(dq) {
            match block {
                GroupBlock::So3(iv, w) => jac.fixed_view_mut::<3, 3>(iv, iv).copy_from(&so3_block(&w)),
                GroupBlock::Se3(iv, nu) => jac.fixed_view_mut::<6, 6>(iv, iv).copy_from(&se3_block(&nu)),
            }
        }
        jac
    }
}

impl State for StateMultibody {
    fn nx(&self) -> usize {
        self.model.nq() + self.model.nv()
    }

    fn ndx(&self) -> usize {
        2 * self.model.nv()
    }

    fn nq(&self) -> usize {
        self.model.nq()
    }

    fn nv(&self) -> usize {
        self.model.nv()
    }

    fn zero(&self) -> DVec {
        let mut x = DVec::zeros(self.nx());
        x.rows_mut(0, self.model.nq()).copy_from(&self.model.neutral());
        x
    }

    fn rand(&self, rng: &mut dyn RngCore) -> DVec {
        let nq = self.model.nq();
        let mut x = DVec::zeros(self.nx());
        for joint in self.model.joints() {
            let iq = joint.idx_q;
            let (lo, hi) = (joint.lower, joint.upper);
            match joint.kind {
                JointKind::Revolute | JointKind::Prismatic => x[iq] = rng.gen_range(lo..=hi),
                JointKind::Spherical => write_quat(&mut x, iq, &random_rotation(rng)),
                JointKind::FreeFlyer => {
                    for k in 0..3 {
                        x[iq + k] = rng.gen_range(lo..=hi);
                    }
                    write_quat(&mut x, iq + 3, &random_rotation(rng));
                }
            }
        }
        for k in nq..self.nx() {
            x[k] = rng.gen_range(-1.0..=1.0);
        }
        x
    }

    fn diff(&self, x0: &DVec, x1: &DVec) -> ModelResult<DVec> {
        self.check_x(x0)?;
        self.check_x(x1)?;
        let (nq, nv) = (self.model.nq(), self.model.nv());

        let mut dx = DVec::zeros(self.ndx());
        self.difference(x0, x1, &mut dx);
        let dv = x1.rows(nq, nv) - x0.rows(nq, nv);
        dx.rows_mut(nv, nv).copy_from(&dv);
        Ok(dx)
    }

    fn integrate(&self, x: &DVec, dx: &DVec) -> ModelResult<DVec> {
        self.check_x(x)?;
        self.check_dx(dx)?;
        let (nq, nv) = (self.model.nq(), self.model.nv());

        let mut out = DVec::zeros(self.nx());
        self.increment(x, dx, &mut out);
        let v = x.rows(nq, nv) + dx.rows(nv, nv);
        out.rows_mut(nq, nv).copy_from(&v);
        Ok(out)
    }

    fn jdiff(&self, x0: &DVec, x1: &DVec, which: Jcomponent) -> ModelResult<Jacobians> {
        // The group blocks only depend on d = diff(q0, q1)
        let dx = self.diff(x0, x1)?;
        let mut jac = Jacobians::allocate(self.ndx(), which);

        if which.first() {
            jac.first = self.block_jacobian(
                &dx,
                -1.0,
                |d| -jlog3(d) * rotation_matrix(&exp3(d)).transpose(),
                |d| -jlog6(d) * adjoint(&exp6(d).inverse()),
            );
        }
        if which.second() {
            jac.second = self.block_jacobian(&dx, 1.0, jlog3, jlog6);
        }
        Ok(jac)
    }

    fn jintegrate(&self, x: &DVec, dx: &DVec, which: Jcomponent) -> ModelResult<Jacobians> {
        self.check_x(x)?;
        self.check_dx(dx)?;
        let mut jac = Jacobians::allocate(self.ndx(), which);

        if which.first() {
            jac.first = self.block_jacobian(
                dx,
                1.0,
                |d| rotation_matrix(&exp3(d)).transpose(),
                |d| adjoint(&exp6(d).inverse()),
            );
        }
        if which.second() {
            jac.second = self.block_jacobian(dx, 1.0, jexp3, jexp6);
        }
        Ok(jac)
    }
}
