#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

mod axis_rotation;
mod config;
mod error;
mod estimate;
mod gyro_bias;
mod mag_calibration;
mod processor;
mod sample;
mod sample_rate;
mod sample_thread;
mod source;

pub use crate::axis_rotation::AxisRotation;
pub use crate::config::ImuConfig;
pub use crate::error::ConfigError;
pub use crate::estimate::{pressure_to_height, PublishedEstimate};
pub use crate::gyro_bias::GyroBias;
pub use crate::mag_calibration::MagCalibration;
pub use crate::processor::ImuProcessor;
pub use crate::sample::RawSample;
pub use crate::sample_rate::SampleRateCounter;
pub use crate::sample_thread::{EstimateReader, SampleThread};
pub use crate::source::{ChannelSource, ImuSource};
