use nalgebra::{Quaternion, Vector3};

use crate::math::{QuaternionExt, VectorExt};

const MICROS_PER_SECOND: f64 = 1_000_000.;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionOutput {
	/// Roll, pitch, yaw in radians.
	pub pose: Vector3<f64>,
	pub qpose: Quaternion<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FilterState {
	Uninitialized,
	Tracking {
		state_q: Quaternion<f64>,
		last_timestamp: u64,
	},
}

/// Quaternion complementary filter.
///
/// The state is predicted by integrating the gyroscope, then rotated toward the pose measured
/// from the accelerometer (roll, pitch) and the magnetometer (yaw) by a fraction of the angle
/// between them.
#[derive(Debug, Clone)]
pub struct SlerpFusion {
	/// Fraction of the angle between the predicted and measured poses applied at each update.
	/// 0 ignores the measured pose (gyroscope only), 1 replaces the prediction by it.
	slerp_power: f64,
	/// Subtracted from the measured heading, in radians.
	compass_declination: f64,
	enable_gyro: bool,
	enable_accel: bool,
	enable_mag: bool,
	state: FilterState,
	fusion_pose: Vector3<f64>,
	fusion_qpose: Quaternion<f64>,
	measured_pose: Vector3<f64>,
	measured_qpose: Quaternion<f64>,
	accel: Vector3<f64>,
	sample_number: u64,
}

impl Default for SlerpFusion {
	fn default() -> Self {
		SlerpFusion::new(0.02)
	}
}

impl SlerpFusion {
	pub fn new(slerp_power: f64) -> Self {
		let mut instance = SlerpFusion {
			slerp_power,
			compass_declination: 0.,
			enable_gyro: true,
			enable_accel: true,
			enable_mag: true,
			state: FilterState::Uninitialized,
			fusion_pose: Vector3::zeros(),
			fusion_qpose: Quaternion::identity(),
			measured_pose: Vector3::zeros(),
			measured_qpose: Quaternion::identity(),
			accel: Vector3::zeros(),
			sample_number: 0,
		};
		instance.reset();
		instance
	}

	/// Forgets the current estimate. The next sample initializes the filter again.
	pub fn reset(&mut self) {
		self.state = FilterState::Uninitialized;
		self.fusion_pose = Vector3::zeros();
		self.fusion_qpose = Quaternion::from_euler(&self.fusion_pose);
		self.measured_pose = Vector3::zeros();
		self.measured_qpose = Quaternion::from_euler(&self.measured_pose);
		self.accel = Vector3::zeros();
		self.sample_number = 0;
	}

	pub fn slerp_power(&self) -> f64 {
		self.slerp_power
	}

	pub fn set_slerp_power(&mut self, slerp_power: f64) {
		self.slerp_power = slerp_power;
	}

	pub fn set_compass_declination(&mut self, declination: f64) {
		self.compass_declination = declination;
	}

	pub fn set_enable_gyro(&mut self, enable: bool) {
		self.enable_gyro = enable;
	}

	pub fn set_enable_accel(&mut self, enable: bool) {
		self.enable_accel = enable;
	}

	pub fn set_enable_mag(&mut self, enable: bool) {
		self.enable_mag = enable;
	}

	pub fn is_initialized(&self) -> bool {
		self.state != FilterState::Uninitialized
	}

	pub fn sample_number(&self) -> u64 {
		self.sample_number
	}

	pub fn fusion_pose(&self) -> Vector3<f64> {
		self.fusion_pose
	}

	pub fn fusion_qpose(&self) -> Quaternion<f64> {
		self.fusion_qpose
	}

	pub fn measured_pose(&self) -> Vector3<f64> {
		self.measured_pose
	}

	pub fn measured_qpose(&self) -> Quaternion<f64> {
		self.measured_qpose
	}

	/// Processes one sample. `timestamp` is in microseconds.
	///
	/// `mag` should only be given once it is calibrated, otherwise the heading is held.
	/// Samples whose timestamp does not move forward leave the estimate unchanged.
	pub fn update(
		&mut self,
		timestamp: u64,
		gyro: Option<&Vector3<f64>>,
		accel: Option<&Vector3<f64>>,
		mag: Option<&Vector3<f64>>,
	) -> FusionOutput {
		self.sample_number += 1;

		if let Some(accel) = accel {
			self.accel = *accel;
		}

		self.measure(accel, mag);

		self.state = match self.state {
			FilterState::Uninitialized => {
				self.fusion_qpose = self.measured_qpose;
				self.fusion_pose = self.measured_pose;

				FilterState::Tracking {
					state_q: self.measured_qpose,
					last_timestamp: timestamp,
				}
			}
			FilterState::Tracking { mut state_q, last_timestamp } => {
				if timestamp > last_timestamp {
					let dt = (timestamp - last_timestamp) as f64 / MICROS_PER_SECOND;

					if let Some(gyro) = gyro.filter(|_| self.enable_gyro) {
						state_q = predict(&state_q, gyro, dt);
					}

					if self.enable_accel || self.enable_mag {
						state_q = self.correct(&state_q);
					}

					self.fusion_qpose = state_q;
					self.fusion_pose = state_q.to_euler();
				}

				FilterState::Tracking {
					state_q,
					last_timestamp: timestamp,
				}
			}
		};

		self.output()
	}

	pub fn output(&self) -> FusionOutput {
		FusionOutput {
			pose: self.fusion_pose,
			qpose: self.fusion_qpose,
		}
	}

	/// Last accelerometer reading with gravity, as seen through the fused pose, removed.
	pub fn accel_residuals(&self) -> Vector3<f64> {
		let gravity = Quaternion::new(0., 0., 0., 1.);
		let rotated = self.fusion_qpose.conjugate() * (gravity * self.fusion_qpose);

		-(self.accel - rotated.imag())
	}

	fn measure(&mut self, accel: Option<&Vector3<f64>>, mag: Option<&Vector3<f64>>) {
		let mut pose = match accel.filter(|_| self.enable_accel) {
			Some(accel) => accel.accel_to_euler(),
			None => Vector3::new(self.fusion_pose.x, self.fusion_pose.y, 0.),
		};

		pose.z = match mag.filter(|_| self.enable_mag) {
			Some(mag) => {
				let tilt: Quaternion<f64> = Quaternion::from_euler(&Vector3::new(pose.x, pose.y, 0.));
				let horizontal = tilt.rotate(mag);

				-horizontal.y.atan2(horizontal.x) - self.compass_declination
			}
			None => self.fusion_pose.z,
		};

		let mut qpose: Quaternion<f64> = Quaternion::from_euler(&pose);

		// q and -q are the same rotation, but the correction must not take the long way around.
		let index = qpose.dominant_component();
		if qpose.component(index) * self.fusion_qpose.component(index) < 0. {
			qpose = qpose * -1.;
			pose = qpose.to_euler();
		}

		self.measured_pose = pose;
		self.measured_qpose = qpose;
	}

	fn correct(&self, state_q: &Quaternion<f64>) -> Quaternion<f64> {
		let delta = (state_q.conjugate() * self.measured_qpose).safe_normalize();

		let theta = delta.w.max(-1.).min(1.).acos();
		let (sin_power_theta, cos_power_theta) = (theta * self.slerp_power).sin_cos();

		let axis = delta.imag().safe_normalize();
		let power = Quaternion::from_parts(cos_power_theta, axis * sin_power_theta).safe_normalize();

		(state_q * power).safe_normalize()
	}
}

/// First order integration of `q' = q * (0, w) / 2`.
fn predict(state_q: &Quaternion<f64>, gyro: &Vector3<f64>, dt: f64) -> Quaternion<f64> {
	let q_dot = state_q * Quaternion::from_parts(0., *gyro) * 0.5;

	(state_q + q_dot * dt).safe_normalize()
}
