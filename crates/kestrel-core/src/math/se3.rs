//! SE(3) Lie-group utilities
//!
//! Rigid transforms are `Isometry3` and their tangent vectors are
//! [`Motion`]s with the linear part first, `ν = [ρ; φ]`.
//!
//! Conventions (right perturbation, matching [`super::rotation`]):
//!
//! ```text
//! log6(M · exp6(δ)) ≈ log6(M) + Jlog6(log6(M)) · δ
//! exp6(ν + δ)       ≈ exp6(ν) · exp6(Jexp6(ν) · δ)
//! M · exp6(δ) · M⁻¹ = exp6(Ad(M) · δ)
//! ```

use nalgebra::{Isometry3, Matrix3, Matrix6, Translation3, Vector3};

use super::rotation::{exp3, jexp3, jlog3, log3, skew};
use crate::Motion;

/// Below this angle the SO(3) coefficients switch to Taylor expansions
const SMALL_ANGLE: f64 = 1e-4;

/// Below this angle the coupling coefficients of `Jexp6` switch to Taylor
/// expansions. Their closed forms cancel up to fourth order in θ.
const SMALL_ANGLE_COUPLING: f64 = 1e-2;

fn linear(nu: &Motion) -> Vector3<f64> {
    nu.fixed_rows::<3>(0).into_owned()
}

fn angular(nu: &Motion) -> Vector3<f64> {
    nu.fixed_rows::<3>(3).into_owned()
}

/// Left Jacobian of SO(3), `V(φ) = I + a [φ]× + b [φ]×²`
fn left_jacobian3(phi: &Vector3<f64>) -> Matrix3<f64> {
    let theta = phi.norm();
    let t2 = theta * theta;

    let (a, b) = if theta < SMALL_ANGLE {
        (0.5 - t2 / 24.0, 1.0 / 6.0 - t2 / 120.0)
    } else {
        let (st, ct) = theta.sin_cos();
        ((1.0 - ct) / t2, (theta - st) / (t2 * theta))
    };

    let phi_hat = skew(phi);
    Matrix3::identity() + phi_hat * a + phi_hat * phi_hat * b
}

/// Inverse of [`left_jacobian3`], `V⁻¹(φ) = I - ½ [φ]× + γ [φ]×²`
fn inv_left_jacobian3(phi: &Vector3<f64>) -> Matrix3<f64> {
    let theta = phi.norm();
    let t2 = theta * theta;

    let gamma = if theta < SMALL_ANGLE {
        1.0 / 12.0 + t2 / 720.0
    } else {
        let (st, ct) = theta.sin_cos();
        (1.0 - theta * st / (2.0 * (1.0 - ct))) / t2
    };

    let phi_hat = skew(phi);
    Matrix3::identity() - phi_hat * 0.5 + phi_hat * phi_hat * gamma
}

/// Translation-rotation coupling block of the right Jacobian of SE(3)
///
/// ```text
/// Q(ρ, φ) = -½ ρ^ + c1 (φ^ρ^ + ρ^φ^ - φ^ρ^φ^)
///                 - c2 (φ^φ^ρ^ + ρ^φ^φ^ - 3 φ^ρ^φ^)
///                 + c3 (φ^ρ^φ^φ^ + φ^φ^ρ^φ^)
/// c1 = (θ - sinθ)/θ³
/// c2 = (θ² + 2cosθ - 2)/(2θ⁴)
/// c3 = (2θ - 3sinθ + θcosθ)/(2θ⁵)
/// ```
fn coupling(rho: &Vector3<f64>, phi: &Vector3<f64>) -> Matrix3<f64> {
    let theta = phi.norm();
    let t2 = theta * theta;

    let (c1, c2, c3) = if theta < SMALL_ANGLE_COUPLING {
        (
            1.0 / 6.0 - t2 / 120.0,
            1.0 / 24.0 - t2 / 720.0,
            1.0 / 120.0 - t2 / 2520.0,
        )
    } else {
        let (st, ct) = theta.sin_cos();
        let t4 = t2 * t2;
        (
            (theta - st) / (t2 * theta),
            (t2 + 2.0 * ct - 2.0) / (2.0 * t4),
            (2.0 * theta - 3.0 * st + theta * ct) / (2.0 * t4 * theta),
        )
    };

    let p = skew(phi);
    let r = skew(rho);
    let pr = p * r;
    let rp = r * p;
    let prp = pr * p;

    r * -0.5 + (pr + rp - prp) * c1 - (p * pr + rp * p - prp * 3.0) * c2 + (prp * p + p * prp) * c3
}

/// Exponential map: motion `[ρ; φ]` → rigid transform
pub fn exp6(nu: &Motion) -> Isometry3<f64> {
    let phi = angular(nu);
    let t = left_jacobian3(&phi) * linear(nu);
    Isometry3::from_parts(Translation3::from(t), exp3(&phi))
}

/// Logarithm map: rigid transform → motion `[ρ; φ]`
pub fn log6(m: &Isometry3<f64>) -> Motion {
    let phi = log3(&m.rotation);
    let rho = inv_left_jacobian3(&phi) * m.translation.vector;
    let mut nu = Motion::zeros();
    nu.fixed_rows_mut::<3>(0).copy_from(&rho);
    nu.fixed_rows_mut::<3>(3).copy_from(&phi);
    nu
}

/// Right Jacobian of SE(3)
///
/// ```text
/// Jexp6(ν) = [Jr(φ)  Q(ρ, φ)]
///            [  0     Jr(φ) ]
/// ```
///
/// `Q(ρ, φ)` is the left-Jacobian coupling block evaluated at `-ν`.
pub fn jexp6(nu: &Motion) -> Matrix6<f64> {
    let phi = angular(nu);
    let jr = jexp3(&phi);
    let mut jac = Matrix6::zeros();
    jac.fixed_view_mut::<3, 3>(0, 0).copy_from(&jr);
    jac.fixed_view_mut::<3, 3>(3, 3).copy_from(&jr);
    jac.fixed_view_mut::<3, 3>(0, 3)
        .copy_from(&coupling(&linear(nu), &phi));
    jac
}

/// Inverse right Jacobian of SE(3), evaluated at `r = log6(M)`
///
/// ```text
/// Jlog6(r) = [Jlog3  -Jlog3 Q Jlog3]
///            [  0        Jlog3     ]
/// ```
///
/// Used in: derivative of `log6(Mref⁻¹ M)` with respect to `M`.
pub fn jlog6(r: &Motion) -> Matrix6<f64> {
    let phi = angular(r);
    let jl = jlog3(&phi);
    let mut jac = Matrix6::zeros();
    jac.fixed_view_mut::<3, 3>(0, 0).copy_from(&jl);
    jac.fixed_view_mut::<3, 3>(3, 3).copy_from(&jl);
    jac.fixed_view_mut::<3, 3>(0, 3)
        .copy_from(&(-jl * coupling(&linear(r), &phi) * jl));
    jac
}

/// Adjoint of a rigid transform acting on motions
///
/// ```text
/// Ad(M) = [R  [p]× R]
///         [0    R   ]
/// ```
pub fn adjoint(m: &Isometry3<f64>) -> Matrix6<f64> {
    let rot = m.rotation.to_rotation_matrix().into_inner();
    let mut ad = Matrix6::zeros();
    ad.fixed_view_mut::<3, 3>(0, 0).copy_from(&rot);
    ad.fixed_view_mut::<3, 3>(3, 3).copy_from(&rot);
    ad.fixed_view_mut::<3, 3>(0, 3)
        .copy_from(&(skew(&m.translation.vector) * rot));
    ad
}
