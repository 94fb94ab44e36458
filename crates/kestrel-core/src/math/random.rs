//! Random sampling of rotations, placements and spatial motions
//!
//! Used to generate random references and state samples in the same way as
//! `SE3::Random()` / `Motion::Random()` in common rigid-body libraries.

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3, Vector4};
use rand::Rng;

use crate::Motion;

/// Uniformly distributed random rotation
///
/// Rejection-samples a point inside the unit 4-ball and normalizes it, which
/// yields a uniform distribution on S³.
pub fn random_rotation<R: Rng + ?Sized>(rng: &mut R) -> UnitQuaternion<f64> {
    loop {
        let v = Vector4::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let n = v.norm();
        if n > 1e-3 && n <= 1.0 {
            // Vector4 layout is (i, j, k, w)
            return UnitQuaternion::from_quaternion(Quaternion::from(v));
        }
    }
}

/// Random vector with components in [-1, 1]
pub fn random_vector3<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    Vector3::new(
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
    )
}

/// Random rigid placement: uniform rotation, translation in [-1, 1]³
pub fn random_placement<R: Rng + ?Sized>(rng: &mut R) -> Isometry3<f64> {
    let translation = random_vector3(rng);
    let rotation = random_rotation(rng);
    Isometry3::from_parts(Translation3::from(translation), rotation)
}

/// Random spatial motion with components in [-1, 1]
pub fn random_motion<R: Rng + ?Sized>(rng: &mut R) -> Motion {
    Motion::from_fn(|_, _| rng.gen_range(-1.0..=1.0))
}
