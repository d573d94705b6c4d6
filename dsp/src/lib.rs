#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

pub use crate::exponential_average::ExponentialAverage;

pub mod exponential_average;
