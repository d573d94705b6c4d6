use nalgebra::Vector3;

/// One reading of the sensor set. A `None` field was not measured in this read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawSample {
	/// Monotonic, in microseconds.
	pub timestamp: u64,
	/// rad/s
	pub gyro: Option<Vector3<f64>>,
	/// g
	pub accel: Option<Vector3<f64>>,
	/// µT
	pub mag: Option<Vector3<f64>>,
	/// hPa
	pub pressure: Option<f64>,
	/// °C
	pub temperature: Option<f64>,
	/// %RH
	pub humidity: Option<f64>,
}

impl RawSample {
	pub fn new(
		timestamp: u64,
		gyro: Option<Vector3<f64>>,
		accel: Option<Vector3<f64>>,
		mag: Option<Vector3<f64>>,
	) -> Self {
		RawSample {
			timestamp,
			gyro,
			accel,
			mag,
			..Default::default()
		}
	}
}
