use dsp::ExponentialAverage;
use nalgebra::Vector3;

use crate::error::ConfigError;
use crate::sample::RawSample;

/// Above this change between two accelerometer readings (g), the body is moving.
const ACCEL_ZERO_THRESHOLD: f64 = 0.05;
/// Above this angular rate (rad/s), the body is rotating.
const GYRO_ZERO_THRESHOLD: f64 = 0.20;
const LEARNING_PERIOD_SECONDS: u32 = 5;

/// Online estimation of the gyroscope zero-rate offset.
///
/// The offset is learnt while the body is stationary: quickly for the first five seconds of
/// stationary samples, then slowly to follow drift.
#[derive(Debug, Clone)]
pub struct GyroBias {
	learning_alpha: f64,
	continuous_alpha: f64,
	learning_samples: u32,
	required_samples: u32,
	bias: ExponentialAverage<f64>,
	previous_accel: Vector3<f64>,
	valid: bool,
}

impl GyroBias {
	/// `sample_rate` is the nominal output data rate, in Hz.
	pub fn new(sample_rate: u32) -> Result<Self, ConfigError> {
		if sample_rate == 0 {
			return Err(ConfigError::InvalidSampleRate(sample_rate));
		}

		let learning_alpha = 2. / sample_rate as f64;

		Ok(GyroBias {
			learning_alpha,
			continuous_alpha: 0.01 / sample_rate as f64,
			learning_samples: 0,
			required_samples: LEARNING_PERIOD_SECONDS.saturating_mul(sample_rate),
			bias: ExponentialAverage::new(learning_alpha),
			previous_accel: Vector3::zeros(),
			valid: false,
		})
	}

	/// Smoothing factor used once the bias is valid.
	pub fn set_continuous_learning_alpha(&mut self, alpha: f64) -> Result<(), ConfigError> {
		if !(0.0..1.0).contains(&alpha) {
			return Err(ConfigError::InvalidLearningAlpha(alpha));
		}

		self.continuous_alpha = alpha;

		Ok(())
	}

	pub fn continuous_learning_alpha(&self) -> f64 {
		self.continuous_alpha
	}

	pub fn bias(&self) -> Vector3<f64> {
		self.bias.value()
	}

	/// True once enough stationary samples were seen.
	pub fn is_valid(&self) -> bool {
		self.valid
	}

	/// Returns the gyroscope reading with the current bias removed, `None` without one.
	pub fn update(&mut self, sample: &RawSample) -> Option<Vector3<f64>> {
		let accel_still = match sample.accel {
			Some(accel) => {
				let delta = self.previous_accel - accel;
				self.previous_accel = accel;

				delta.norm() < ACCEL_ZERO_THRESHOLD
			}
			None => false,
		};

		let gyro = sample.gyro?;

		if accel_still && gyro.norm() < GYRO_ZERO_THRESHOLD {
			self.learn(&gyro);
		}

		Some(gyro - self.bias.value())
	}

	fn learn(&mut self, gyro: &Vector3<f64>) {
		if self.learning_samples < self.required_samples {
			self.bias.set_alpha(self.learning_alpha);
			self.bias.update(gyro);

			self.learning_samples += 1;

			if self.learning_samples == self.required_samples {
				self.valid = true;

				let bias = self.bias.value();
				info!("Gyroscope bias valid: [{:.5}, {:.5}, {:.5}] rad/s", bias.x, bias.y, bias.z);
			}
		} else {
			self.bias.set_alpha(self.continuous_alpha);
			self.bias.update(gyro);
		}
	}
}
