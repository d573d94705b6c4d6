use ahrs::SlerpFusion;

use crate::axis_rotation::AxisRotation;
use crate::config::ImuConfig;
use crate::error::ConfigError;
use crate::estimate::{pressure_to_height, PublishedEstimate};
use crate::gyro_bias::GyroBias;
use crate::mag_calibration::MagCalibration;
use crate::sample::RawSample;

/// Sample processing chain: axis remapping, gyroscope bias removal, magnetometer calibration,
/// then fusion.
#[derive(Debug, Clone)]
pub struct ImuProcessor {
	axis_rotation: AxisRotation,
	gyro_bias: GyroBias,
	mag_calibration: MagCalibration,
	fusion: SlerpFusion,
	static_pressure: f64,
}

impl ImuProcessor {
	pub fn new(config: &ImuConfig, sample_rate: u32) -> Result<Self, ConfigError> {
		config.validate()?;

		let mut gyro_bias = GyroBias::new(sample_rate)?;

		if let Some(alpha) = config.gyro_continuous_alpha {
			gyro_bias.set_continuous_learning_alpha(alpha)?;
		}

		let mut fusion = SlerpFusion::new(config.slerp_power);
		fusion.set_compass_declination(config.compass_declination);
		fusion.set_enable_gyro(config.enable_gyro);
		fusion.set_enable_accel(config.enable_accel);
		fusion.set_enable_mag(config.enable_mag);

		Ok(ImuProcessor {
			axis_rotation: config.axis_rotation,
			gyro_bias,
			mag_calibration: MagCalibration::new(),
			fusion,
			static_pressure: config.static_pressure,
		})
	}

	pub fn gyro_bias(&self) -> &GyroBias {
		&self.gyro_bias
	}

	pub fn mag_calibration(&self) -> &MagCalibration {
		&self.mag_calibration
	}

	pub fn fusion(&self) -> &SlerpFusion {
		&self.fusion
	}

	/// The sample rate of the returned estimate is left at 0.
	pub fn process(&mut self, sample: RawSample) -> PublishedEstimate {
		let mut sample = self.axis_rotation.apply(&sample);

		sample.gyro = self.gyro_bias.update(&sample);

		let mag_calibration = &mut self.mag_calibration;
		sample.mag = sample.mag.map(|mag| mag_calibration.update(&mag));

		// An uncalibrated magnetometer would drag the heading around, keep it out of the fusion.
		let heading_reference = sample.mag.filter(|_| self.mag_calibration.is_valid());

		let output = self.fusion.update(
			sample.timestamp,
			sample.gyro.as_ref(),
			sample.accel.as_ref(),
			heading_reference.as_ref(),
		);

		let static_pressure = self.static_pressure;

		PublishedEstimate {
			timestamp: sample.timestamp,
			fusion_pose: output.pose,
			fusion_qpose: output.qpose,
			fusion_valid: self.fusion.is_initialized(),
			gyro: sample.gyro,
			accel: sample.accel,
			mag: sample.mag,
			accel_residuals: sample.accel.map(|_| self.fusion.accel_residuals()),
			pressure: sample.pressure,
			temperature: sample.temperature,
			humidity: sample.humidity,
			height: sample.pressure.map(|pressure| pressure_to_height(pressure, static_pressure)),
			gyro_bias_valid: self.gyro_bias.is_valid(),
			mag_cal_valid: self.mag_calibration.is_valid(),
			sample_rate: 0,
		}
	}
}
