use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::error::ConfigError;
use crate::sample::RawSample;

/// Mounting orientation of the sensor board, named after where its x and y axes point.
///
/// The discriminant is the numeric code used in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AxisRotation {
	XNorthYEast = 0,
	XEastYSouth,
	XSouthYWest,
	XWestYNorth,
	XNorthYWest,
	XEastYNorth,
	XSouthYEast,
	XWestYSouth,
	XUpYNorth,
	XUpYEast,
	XUpYSouth,
	XUpYWest,
	XDownYNorth,
	XDownYEast,
	XDownYSouth,
	XDownYWest,
	XNorthYUp,
	XEastYUp,
	XSouthYUp,
	XWestYUp,
	XNorthYDown,
	XEastYDown,
	XSouthYDown,
	XWestYDown,
}

impl Default for AxisRotation {
	fn default() -> Self {
		AxisRotation::XNorthYEast
	}
}

impl AxisRotation {
	pub const ALL: [AxisRotation; 24] = [
		AxisRotation::XNorthYEast,
		AxisRotation::XEastYSouth,
		AxisRotation::XSouthYWest,
		AxisRotation::XWestYNorth,
		AxisRotation::XNorthYWest,
		AxisRotation::XEastYNorth,
		AxisRotation::XSouthYEast,
		AxisRotation::XWestYSouth,
		AxisRotation::XUpYNorth,
		AxisRotation::XUpYEast,
		AxisRotation::XUpYSouth,
		AxisRotation::XUpYWest,
		AxisRotation::XDownYNorth,
		AxisRotation::XDownYEast,
		AxisRotation::XDownYSouth,
		AxisRotation::XDownYWest,
		AxisRotation::XNorthYUp,
		AxisRotation::XEastYUp,
		AxisRotation::XSouthYUp,
		AxisRotation::XWestYUp,
		AxisRotation::XNorthYDown,
		AxisRotation::XEastYDown,
		AxisRotation::XSouthYDown,
		AxisRotation::XWestYDown,
	];

	pub fn code(&self) -> u8 {
		*self as u8
	}

	/// Row `i` gives component `i` of the remapped vector.
	#[rustfmt::skip]
	pub fn matrix(&self) -> Matrix3<f64> {
		let m = match self {
			AxisRotation::XNorthYEast => [ 1.,  0.,  0.,   0.,  1.,  0.,   0.,  0.,  1.],
			AxisRotation::XEastYSouth => [ 0., -1.,  0.,   1.,  0.,  0.,   0.,  0.,  1.],
			AxisRotation::XSouthYWest => [-1.,  0.,  0.,   0., -1.,  0.,   0.,  0.,  1.],
			AxisRotation::XWestYNorth => [ 0.,  1.,  0.,  -1.,  0.,  0.,   0.,  0.,  1.],
			AxisRotation::XNorthYWest => [ 1.,  0.,  0.,   0., -1.,  0.,   0.,  0., -1.],
			AxisRotation::XEastYNorth => [ 0.,  1.,  0.,   1.,  0.,  0.,   0.,  0., -1.],
			AxisRotation::XSouthYEast => [-1.,  0.,  0.,   0.,  1.,  0.,   0.,  0., -1.],
			AxisRotation::XWestYSouth => [ 0., -1.,  0.,  -1.,  0.,  0.,   0.,  0., -1.],
			AxisRotation::XUpYNorth   => [ 0.,  1.,  0.,   0.,  0., -1.,  -1.,  0.,  0.],
			AxisRotation::XUpYEast    => [ 0.,  0.,  1.,   0.,  1.,  0.,  -1.,  0.,  0.],
			AxisRotation::XUpYSouth   => [ 0., -1.,  0.,   0.,  0.,  1.,  -1.,  0.,  0.],
			AxisRotation::XUpYWest    => [ 0.,  0., -1.,   0., -1.,  0.,  -1.,  0.,  0.],
			AxisRotation::XDownYNorth => [ 0.,  1.,  0.,   0.,  0.,  1.,   1.,  0.,  0.],
			AxisRotation::XDownYEast  => [ 0.,  0., -1.,   0.,  1.,  0.,   1.,  0.,  0.],
			AxisRotation::XDownYSouth => [ 0., -1.,  0.,   0.,  0., -1.,   1.,  0.,  0.],
			AxisRotation::XDownYWest  => [ 0.,  0.,  1.,   0., -1.,  0.,   1.,  0.,  0.],
			AxisRotation::XNorthYUp   => [ 1.,  0.,  0.,   0.,  0.,  1.,   0., -1.,  0.],
			AxisRotation::XEastYUp    => [ 0.,  0., -1.,   1.,  0.,  0.,   0., -1.,  0.],
			AxisRotation::XSouthYUp   => [-1.,  0.,  0.,   0.,  0., -1.,   0., -1.,  0.],
			AxisRotation::XWestYUp    => [ 0.,  0.,  1.,  -1.,  0.,  0.,   0., -1.,  0.],
			AxisRotation::XNorthYDown => [ 1.,  0.,  0.,   0.,  0., -1.,   0.,  1.,  0.],
			AxisRotation::XEastYDown  => [ 0.,  0.,  1.,   1.,  0.,  0.,   0.,  1.,  0.],
			AxisRotation::XSouthYDown => [-1.,  0.,  0.,   0.,  0.,  1.,   0.,  1.,  0.],
			AxisRotation::XWestYDown  => [ 0.,  0., -1.,  -1.,  0.,  0.,   0.,  1.,  0.],
		};

		Matrix3::new(
			m[0], m[1], m[2],
			m[3], m[4], m[5],
			m[6], m[7], m[8],
		)
	}

	/// Remaps gyroscope, accelerometer and magnetometer readings. Other fields are copied.
	pub fn apply(&self, sample: &RawSample) -> RawSample {
		if *self == AxisRotation::XNorthYEast {
			return *sample;
		}

		let matrix = self.matrix();

		RawSample {
			gyro: sample.gyro.map(|gyro| matrix * gyro),
			accel: sample.accel.map(|accel| matrix * accel),
			mag: sample.mag.map(|mag| matrix * mag),
			..*sample
		}
	}
}

impl From<AxisRotation> for u8 {
	fn from(rotation: AxisRotation) -> Self {
		rotation.code()
	}
}

impl TryFrom<u8> for AxisRotation {
	type Error = ConfigError;

	fn try_from(code: u8) -> Result<Self, Self::Error> {
		AxisRotation::ALL
			.get(code as usize)
			.copied()
			.ok_or(ConfigError::InvalidAxisRotation(code))
	}
}
