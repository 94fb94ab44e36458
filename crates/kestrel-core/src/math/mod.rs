//! Mathematical utilities for Kestrel
//!
//! SO(3) and SE(3) exponential/logarithm maps with their Jacobians, and
//! random sampling of rotations, placements and spatial motions.

pub mod rotation;
pub mod se3;
pub mod random;

pub use rotation::*;
pub use se3::*;
pub use random::*;
