use ahrs::QuaternionExt;
use imu::{ImuSource, RawSample};
use nalgebra::{Quaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Motion and sensor defects of the simulated board.
///
/// The board rests for `still_seconds`, then tumbles: roll and pitch oscillate while the heading
/// turns at a constant rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	pub still_seconds: f64,
	/// Heading at rest, in radians.
	pub initial_yaw: f64,
	pub roll_amplitude: f64,
	/// rad/s
	pub roll_frequency: f64,
	pub pitch_amplitude: f64,
	/// rad/s
	pub pitch_frequency: f64,
	/// rad/s
	pub yaw_rate: f64,
	/// Added to every gyroscope reading, in rad/s.
	pub gyro_bias: [f64; 3],
	/// Local magnetic field in the north, east, down frame, in µT.
	pub earth_field: [f64; 3],
	/// Hard-iron offset added to every magnetometer reading, in µT.
	pub mag_offset: [f64; 3],
	/// Sea level pressure seen by the barometer, in hPa.
	pub pressure: f64,
	/// °C
	pub temperature: f64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		SimulationConfig {
			still_seconds: 6.,
			initial_yaw: 0.3,
			roll_amplitude: 1.,
			roll_frequency: 0.7,
			pitch_amplitude: 0.5,
			pitch_frequency: 0.45,
			yaw_rate: 0.4,
			gyro_bias: [0.02, -0.015, 0.01],
			earth_field: [35., 0., 25.],
			mag_offset: [8., -6., 3.],
			pressure: 1013.25,
			temperature: 21.,
		}
	}
}

/// Sensor board producing noiseless samples in real time from a known trajectory.
pub struct SimulatedImu {
	config: SimulationConfig,
	sample_rate: u32,
	start_instant: Option<Instant>,
	next_index: u64,
	previous_q: Option<Quaternion<f64>>,
}

impl SimulatedImu {
	pub fn new(sample_rate: u32, config: SimulationConfig) -> Self {
		SimulatedImu {
			config,
			sample_rate,
			start_instant: None,
			next_index: 0,
			previous_q: None,
		}
	}

	fn sample_period_us(&self) -> u64 {
		1_000_000 / u64::from(self.sample_rate.max(1))
	}

	/// Roll, pitch, yaw of the board `t` seconds after the start.
	pub fn true_pose(&self, t: f64) -> Vector3<f64> {
		let c = &self.config;

		if t < c.still_seconds {
			return Vector3::new(0., 0., c.initial_yaw);
		}

		let t = t - c.still_seconds;

		Vector3::new(
			c.roll_amplitude * (c.roll_frequency * t).sin(),
			c.pitch_amplitude * (c.pitch_frequency * t).sin(),
			c.initial_yaw + c.yaw_rate * t,
		)
	}

	/// Generates the next sample, regardless of the time elapsed.
	pub fn next_sample(&mut self) -> RawSample {
		let period_us = self.sample_period_us();
		let timestamp = self.next_index * period_us;
		self.next_index += 1;

		let q: Quaternion<f64> = Quaternion::from_euler(&self.true_pose(timestamp as f64 / 1e6));
		let to_body = q.conjugate();

		// Body rates over the last period: q = previous * (1, w * dt / 2).
		let rates = match self.previous_q {
			Some(previous_q) => {
				let delta = previous_q.conjugate() * q;
				delta.imag() * (2. / (period_us as f64 / 1e6))
			}
			None => Vector3::zeros(),
		};
		self.previous_q = Some(q);

		let c = &self.config;
		let gyro_bias = Vector3::new(c.gyro_bias[0], c.gyro_bias[1], c.gyro_bias[2]);
		let earth_field = Vector3::new(c.earth_field[0], c.earth_field[1], c.earth_field[2]);
		let mag_offset = Vector3::new(c.mag_offset[0], c.mag_offset[1], c.mag_offset[2]);

		RawSample {
			pressure: Some(c.pressure),
			temperature: Some(c.temperature),
			..RawSample::new(
				timestamp,
				Some(rates + gyro_bias),
				Some(to_body.rotate(&Vector3::z())),
				Some(to_body.rotate(&earth_field) + mag_offset),
			)
		}
	}
}

impl ImuSource for SimulatedImu {
	fn init(&mut self) -> anyhow::Result<()> {
		if self.sample_rate == 0 {
			return Err(anyhow!("Simulated sample rate must be positive"));
		}

		self.start_instant = Some(Instant::now());

		info!("Simulated IMU running at {} Hz", self.sample_rate);

		Ok(())
	}

	fn sample_rate(&self) -> u32 {
		self.sample_rate
	}

	fn try_read_next(&mut self) -> Option<RawSample> {
		let elapsed_us = self.start_instant?.elapsed().as_micros();

		if u128::from(self.next_index * self.sample_period_us()) <= elapsed_us {
			Some(self.next_sample())
		} else {
			None
		}
	}
}
