#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

pub use crate::math::{pose_from_accel_mag, QuaternionExt, VectorExt};
pub use crate::slerp_fusion::{FusionOutput, SlerpFusion};

pub mod math;
mod slerp_fusion;
