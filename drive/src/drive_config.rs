use anyhow::Context;
use imu::ImuConfig;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs::File;

use crate::simulated_imu::SimulationConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
	pub log_level_filter: String,
	/// Output data rate of the simulated board, in Hz.
	pub sample_rate: u32,
	pub report_period_ms: u64,
	pub simulation: SimulationConfig,
	pub imu: ImuConfig,
}

pub trait TryIntoLevelFilter {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()>;
}

impl TryIntoLevelFilter for String {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()> {
		Ok(match self.as_str() {
			"none" => LevelFilter::Off,
			"error" => LevelFilter::Error,
			"warn" => LevelFilter::Warn,
			"info" => LevelFilter::Info,
			"debug" => LevelFilter::Debug,
			"all" => LevelFilter::Trace,
			_ => return Err(()),
		})
	}
}

impl Default for DriveConfig {
	fn default() -> Self {
		DriveConfig {
			log_level_filter: String::from("info"),
			sample_rate: 100,
			report_period_ms: 1000,
			simulation: SimulationConfig::default(),
			imu: ImuConfig::default(),
		}
	}
}

/// Reads the configuration from a JSON file. Without a file, or for any missing field, defaults
/// are used.
pub fn read(path: Option<&str>) -> anyhow::Result<DriveConfig> {
	let path = match path {
		Some(path) => path,
		None => return Ok(DriveConfig::default()),
	};

	let config_file = File::open(path)
		.with_context(|| format!("Failed to open configuration file \"{}\"", path))?;

	let config: DriveConfig = serde_json::from_reader(config_file)
		.with_context(|| format!("Failed to parse configuration file \"{}\"", path))?;

	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;
	use imu::AxisRotation;

	#[test]
	fn level_filters() {
		assert_eq!(String::from("none").try_into_level_filter(), Ok(LevelFilter::Off));
		assert_eq!(String::from("all").try_into_level_filter(), Ok(LevelFilter::Trace));
		assert_eq!(String::from("verbose").try_into_level_filter(), Err(()));
	}

	#[test]
	fn nested_fields_take_defaults() {
		let config: DriveConfig = serde_json::from_str(
			r#"{
				"log_level_filter": "debug",
				"imu": { "axis_rotation": 8, "enable_mag": false },
				"simulation": { "yaw_rate": 0.1 }
			}"#,
		)
		.unwrap();

		assert_eq!(config.log_level_filter, "debug");
		assert_eq!(config.sample_rate, 100);
		assert_eq!(config.imu.axis_rotation, AxisRotation::XUpYNorth);
		assert!(!config.imu.enable_mag);
		assert_eq!(config.imu.slerp_power, 0.02);
		assert_eq!(config.simulation.yaw_rate, 0.1);
		assert_eq!(config.simulation.still_seconds, 6.);
	}

	#[test]
	fn defaults_without_file() {
		assert_eq!(read(None).unwrap(), DriveConfig::default());
	}

	#[test]
	fn missing_file_is_an_error() {
		assert!(read(Some("does/not/exist.json")).is_err());
	}
}
