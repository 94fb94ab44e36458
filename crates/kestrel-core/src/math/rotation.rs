//! SO(3) Lie-group utilities
//!
//! Exponential and logarithm maps of the rotation group together with their
//! right Jacobians. These are the building blocks of the multibody state
//! manifold and of the frame-placement residual.
//!
//! Conventions (right perturbation):
//!
//! ```text
//! log3(R · exp3(δ)) ≈ log3(R) + Jr⁻¹(log3(R)) · δ
//! exp3(w + δ)       ≈ exp3(w) · exp3(Jr(w) · δ)
//! ```

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

/// Below this angle the Jacobians switch to their Taylor expansions
const SMALL_ANGLE: f64 = 1e-4;

/// Skew-symmetric matrix from vector (hat operator)
///
/// For v = [x, y, z]^T:
/// ```text
/// [v]× = [ 0  -z   y]
///        [ z   0  -x]
///        [-y   x   0]
/// ```
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -v.z, v.y,
        v.z, 0.0, -v.x,
        -v.y, v.x, 0.0,
    )
}

/// Exponential map: rotation vector → unit quaternion
pub fn exp3(w: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_scaled_axis(*w)
}

/// Logarithm map: unit quaternion → rotation vector
///
/// Always returns the shortest rotation, i.e. ‖w‖ ∈ [0, π], regardless of
/// the quaternion sign.
pub fn log3(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    q.scaled_axis()
}

/// Inverse right Jacobian of SO(3)
///
/// ```text
/// Jr⁻¹(w) = α I + ½ [w]× + β w wᵀ
/// α = θ sinθ / (2 (1 - cosθ))
/// β = 1/θ² - sinθ / (2θ (1 - cosθ))
/// ```
///
/// Used in: derivative of `log3(R0ᵀ R1)` with respect to `R1`.
pub fn jlog3(w: &Vector3<f64>) -> Matrix3<f64> {
    let theta = w.norm();
    let t2 = theta * theta;

    let (alpha, beta) = if theta < SMALL_ANGLE {
        (1.0 - t2 / 12.0 - t2 * t2 / 720.0, 1.0 / 12.0 + t2 / 720.0)
    } else {
        let (st, ct) = theta.sin_cos();
        let st_1mct = st / (1.0 - ct);
        (theta * st_1mct / 2.0, 1.0 / t2 - st_1mct / (2.0 * theta))
    };

    Matrix3::identity() * alpha + skew(w) * 0.5 + (w * w.transpose()) * beta
}

/// Right Jacobian of SO(3)
///
/// ```text
/// Jr(w) = I - (1 - cosθ)/θ² [w]× + (θ - sinθ)/θ³ [w]×²
/// ```
pub fn jexp3(w: &Vector3<f64>) -> Matrix3<f64> {
    let theta = w.norm();
    let t2 = theta * theta;

    let (a, b) = if theta < SMALL_ANGLE {
        (0.5 - t2 / 24.0, 1.0 / 6.0 - t2 / 120.0)
    } else {
        let (st, ct) = theta.sin_cos();
        ((1.0 - ct) / t2, (theta - st) / (t2 * theta))
    };

    let w_hat = skew(w);
    Matrix3::identity() - w_hat * a + w_hat * w_hat * b
}

/// Rotation matrix from quaternion
pub fn rotation_matrix(q: &UnitQuaternion<f64>) -> Matrix3<f64> {
    *q.to_rotation_matrix().matrix()
}
