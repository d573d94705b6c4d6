use nalgebra::{Quaternion, Vector3};

/// Snapshot of the processing output, published by the sampling thread after each sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublishedEstimate {
	/// Microseconds, copied from the sample.
	pub timestamp: u64,
	/// Roll, pitch, yaw in radians.
	pub fusion_pose: Vector3<f64>,
	pub fusion_qpose: Quaternion<f64>,
	pub fusion_valid: bool,
	/// Bias corrected.
	pub gyro: Option<Vector3<f64>>,
	pub accel: Option<Vector3<f64>>,
	/// Calibrated and smoothed.
	pub mag: Option<Vector3<f64>>,
	/// Accelerometer reading without gravity, in g.
	pub accel_residuals: Option<Vector3<f64>>,
	pub pressure: Option<f64>,
	pub temperature: Option<f64>,
	pub humidity: Option<f64>,
	/// Meters, derived from `pressure`.
	pub height: Option<f64>,
	pub gyro_bias_valid: bool,
	pub mag_cal_valid: bool,
	/// Samples processed during the last full second.
	pub sample_rate: u32,
}

impl Default for PublishedEstimate {
	fn default() -> Self {
		PublishedEstimate {
			timestamp: 0,
			fusion_pose: Vector3::zeros(),
			fusion_qpose: Quaternion::identity(),
			fusion_valid: false,
			gyro: None,
			accel: None,
			mag: None,
			accel_residuals: None,
			pressure: None,
			temperature: None,
			humidity: None,
			height: None,
			gyro_bias_valid: false,
			mag_cal_valid: false,
			sample_rate: 0,
		}
	}
}

/// Barometric altitude in meters (international standard atmosphere).
pub fn pressure_to_height(pressure: f64, static_pressure: f64) -> f64 {
	44330.8 * (1. - (pressure / static_pressure).powf(0.190263))
}
