use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::axis_rotation::AxisRotation;
use crate::error::ConfigError;

/// Processing options. Missing fields take their default value when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImuConfig {
	pub axis_rotation: AxisRotation,
	/// Fraction of the measured correction applied per sample, in [0, 1].
	pub slerp_power: f64,
	/// Radians, subtracted from the magnetic heading.
	pub compass_declination: f64,
	pub enable_gyro: bool,
	pub enable_accel: bool,
	pub enable_mag: bool,
	/// Overrides the slow gyroscope bias learning rate (default `0.01 / sample_rate`).
	pub gyro_continuous_alpha: Option<f64>,
	/// Sea level pressure used for the height estimate, in hPa.
	pub static_pressure: f64,
	/// Sleep of the sampling thread between two empty reads.
	pub poll_interval_ms: u64,
}

impl Default for ImuConfig {
	fn default() -> Self {
		ImuConfig {
			axis_rotation: AxisRotation::default(),
			slerp_power: 0.02,
			compass_declination: 0.,
			enable_gyro: true,
			enable_accel: true,
			enable_mag: true,
			gyro_continuous_alpha: None,
			static_pressure: 1013.25,
			poll_interval_ms: 2,
		}
	}
}

impl ImuConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !(0.0..=1.0).contains(&self.slerp_power) {
			return Err(ConfigError::InvalidSlerpPower(self.slerp_power));
		}

		if let Some(alpha) = self.gyro_continuous_alpha {
			if !(0.0..1.0).contains(&alpha) {
				return Err(ConfigError::InvalidLearningAlpha(alpha));
			}
		}

		Ok(())
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_is_valid() {
		assert_eq!(ImuConfig::default().validate(), Ok(()));
	}

	#[test]
	fn slerp_power_bounds() {
		for &power in [0., 0.5, 1.].iter() {
			let config = ImuConfig { slerp_power: power, ..Default::default() };
			assert!(config.validate().is_ok());
		}

		for &power in [-0.01, 1.01, std::f64::NAN].iter() {
			let config = ImuConfig { slerp_power: power, ..Default::default() };
			assert!(matches!(config.validate(), Err(ConfigError::InvalidSlerpPower(_))));
		}
	}

	#[test]
	fn continuous_alpha_bounds() {
		let config = ImuConfig { gyro_continuous_alpha: Some(1.), ..Default::default() };
		assert_eq!(config.validate(), Err(ConfigError::InvalidLearningAlpha(1.)));
	}

	#[test]
	fn partial_json_takes_defaults() {
		let config: ImuConfig = serde_json::from_str(
			r#"{ "axis_rotation": 1, "slerp_power": 0.05 }"#
		).unwrap();

		assert_eq!(config.axis_rotation, AxisRotation::XEastYSouth);
		assert_eq!(config.slerp_power, 0.05);
		assert_eq!(config.static_pressure, 1013.25);
		assert!(config.enable_mag);
		assert_eq!(config.poll_interval(), Duration::from_millis(2));
	}
}
