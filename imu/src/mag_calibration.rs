use dsp::ExponentialAverage;
use nalgebra::Vector3;

const COMPASS_ALPHA: f64 = 0.2;
/// Minimum span (µT) each axis must have covered before the calibration is trusted.
const MIN_RANGE: f64 = 30.;
/// Extrema start beyond any plausible reading so that the first one replaces them.
const UNSEEN_EXTREMUM: f64 = 1000.;

/// Online hard-iron calibration of the magnetometer.
///
/// Tracks the extreme readings of each axis while the body is rotated. Once every axis has
/// covered enough range on both sides of zero, readings are centered and scaled so that all
/// axes span the same range.
#[derive(Debug, Clone)]
pub struct MagCalibration {
	max: Vector3<f64>,
	min: Vector3<f64>,
	offset: Vector3<f64>,
	scale: Vector3<f64>,
	max_delta: f64,
	valid: bool,
	average: ExponentialAverage<f64>,
}

impl Default for MagCalibration {
	fn default() -> Self {
		MagCalibration::new()
	}
}

impl MagCalibration {
	pub fn new() -> Self {
		MagCalibration {
			max: Vector3::repeat(-UNSEEN_EXTREMUM),
			min: Vector3::repeat(UNSEEN_EXTREMUM),
			offset: Vector3::zeros(),
			scale: Vector3::repeat(1.),
			max_delta: 0.,
			valid: false,
			average: ExponentialAverage::new(COMPASS_ALPHA),
		}
	}

	pub fn is_valid(&self) -> bool {
		self.valid
	}

	/// Half of the largest per-axis span.
	pub fn max_delta(&self) -> f64 {
		self.max_delta
	}

	pub fn offset(&self) -> Vector3<f64> {
		self.offset
	}

	pub fn scale(&self) -> Vector3<f64> {
		self.scale
	}

	/// Calibrated and smoothed reading. Uncalibrated readings are smoothed as they are.
	pub fn update(&mut self, raw: &Vector3<f64>) -> Vector3<f64> {
		if self.track_extrema(raw) {
			self.recompute();
		}

		let calibrated = self.calibrate(raw);

		self.average.update(&calibrated)
	}

	/// Applies the current calibration without smoothing.
	pub fn calibrate(&self, raw: &Vector3<f64>) -> Vector3<f64> {
		if self.valid {
			(raw - self.offset).component_mul(&self.scale)
		} else {
			*raw
		}
	}

	fn track_extrema(&mut self, raw: &Vector3<f64>) -> bool {
		let mut changed = false;

		for i in 0..3 {
			if raw[i] > self.max[i] {
				self.max[i] = raw[i];
				changed = true;
			}

			if raw[i] < self.min[i] {
				self.min[i] = raw[i];
				changed = true;
			}
		}

		changed
	}

	fn recompute(&mut self) {
		let range = self.max - self.min;

		if !self.valid {
			self.valid = (0..3).all(|i| range[i] >= MIN_RANGE && self.min[i] <= 0. && self.max[i] >= 0.);

			if !self.valid {
				return;
			}

			info!(
				"Magnetometer calibration valid: min [{:.1}, {:.1}, {:.1}], max [{:.1}, {:.1}, {:.1}]",
				self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
			);
		}

		self.max_delta = range.x.max(range.y).max(range.z) / 2.;

		for i in 0..3 {
			self.scale[i] = self.max_delta / (range[i] / 2.);
			self.offset[i] = (self.max[i] + self.min[i]) / 2.;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const OFFSET: [f64; 3] = [10., -5., 3.];
	const RADIUS: [f64; 3] = [40., 35., 20.];

	/// Readings at both ends of every axis of an ellipsoid centered on `OFFSET`.
	fn axis_extremes() -> Vec<Vector3<f64>> {
		let center = Vector3::new(OFFSET[0], OFFSET[1], OFFSET[2]);
		let mut readings = Vec::new();

		for i in 0..3 {
			for &sign in [1., -1.].iter() {
				let mut reading = center;
				reading[i] += sign * RADIUS[i];
				readings.push(reading);
			}
		}

		readings
	}

	#[test]
	fn uncalibrated_readings_are_smoothed() {
		let mut calibration = MagCalibration::new();
		let output = calibration.update(&Vector3::new(10., 20., -30.));

		assert!(!calibration.is_valid());
		assert_approx_eq!(output.x, 2.);
		assert_approx_eq!(output.y, 4.);
		assert_approx_eq!(output.z, -6.);
	}

	#[test]
	fn small_range_is_not_valid() {
		let mut calibration = MagCalibration::new();

		for &(x, y, z) in [(14., 14., 14.), (-14., -14., -14.)].iter() {
			calibration.update(&Vector3::new(x, y, z));
		}

		assert!(!calibration.is_valid());
	}

	#[test]
	fn range_on_one_side_of_zero_is_not_valid() {
		let mut calibration = MagCalibration::new();

		for &(x, y, z) in [(5., -40., -40.), (80., 40., 40.)].iter() {
			calibration.update(&Vector3::new(x, y, z));
		}

		assert!(!calibration.is_valid());
	}

	#[test]
	fn ellipsoid_is_calibrated() {
		let mut calibration = MagCalibration::new();

		for reading in axis_extremes() {
			calibration.update(&reading);
		}

		assert!(calibration.is_valid());
		assert_approx_eq!(calibration.max_delta(), 40.);

		let offset = calibration.offset();
		assert_approx_eq!(offset.x, OFFSET[0]);
		assert_approx_eq!(offset.y, OFFSET[1]);
		assert_approx_eq!(offset.z, OFFSET[2]);

		let scale = calibration.scale();
		assert_approx_eq!(scale.x, 1.);
		assert_approx_eq!(scale.y, 40. / 35.);
		assert_approx_eq!(scale.z, 2.);

		// Every axis now spans [-max_delta, max_delta].
		for reading in axis_extremes() {
			let calibrated = calibration.calibrate(&reading);
			assert_approx_eq!(calibrated.norm(), 40.);
		}
	}

	#[test]
	fn calibrated_output_converges() {
		let mut calibration = MagCalibration::new();

		for reading in axis_extremes() {
			calibration.update(&reading);
		}

		let reading = Vector3::new(OFFSET[0], OFFSET[1] + RADIUS[1], OFFSET[2]);
		let mut output = Vector3::zeros();

		for _ in 0..100 {
			output = calibration.update(&reading);
		}

		assert_approx_eq!(output.x, 0., 1e-6);
		assert_approx_eq!(output.y, 40., 1e-6);
		assert_approx_eq!(output.z, 0., 1e-6);
	}

	#[test]
	fn validity_is_kept() {
		let mut calibration = MagCalibration::new();

		for reading in axis_extremes() {
			calibration.update(&reading);
		}

		// A wider reading moves the extrema but cannot invalidate the calibration.
		calibration.update(&Vector3::new(200., 0., 0.));

		assert!(calibration.is_valid());
		assert_approx_eq!(calibration.max_delta(), (200. + 30.) / 2.);
	}
}
