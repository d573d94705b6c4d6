use nalgebra::{Vector3, RealField, zero};

/// First order low pass filter: `y = alpha * x + (1 - alpha) * y`.
///
/// The smoothing factor can be changed between updates, which allows a fast initial learning rate
/// followed by a slower continuous one.
#[derive(Debug, Clone)]
pub struct ExponentialAverage<N: RealField> {
	alpha: N,
	state: Vector3<N>,
}

impl<N: RealField> ExponentialAverage<N> {
	pub fn new(alpha: N) -> Self {
		Self::with_state(alpha, zero())
	}

	pub fn with_state(alpha: N, state: Vector3<N>) -> Self {
		Self {
			alpha,
			state,
		}
	}

	pub fn set_alpha(&mut self, alpha: N) {
		self.alpha = alpha;
	}

	pub fn value(&self) -> Vector3<N> {
		self.state
	}

	pub fn update(&mut self, value: &Vector3<N>) -> Vector3<N> {
		self.state = value.scale(self.alpha) + self.state.scale(N::one() - self.alpha);

		self.state
	}
}

#[cfg(test)]
mod tests {
	use super::ExponentialAverage;
	use nalgebra::Vector3;

	#[test]
	fn starts_at_zero() {
		let average = ExponentialAverage::<f64>::new(0.2);
		assert_eq!(average.value(), Vector3::zeros());
	}

	#[test]
	fn single_step() {
		let mut average = ExponentialAverage::<f64>::new(0.2);
		let y = average.update(&Vector3::new(10., -5., 1.));

		assert_approx_eq!(y.x, 2.);
		assert_approx_eq!(y.y, -1.);
		assert_approx_eq!(y.z, 0.2);
	}

	#[test]
	fn converges_to_constant_input() {
		let mut average = ExponentialAverage::<f64>::new(0.2);
		let input = Vector3::new(3., 4., -12.);

		for _ in 0..200 {
			average.update(&input);
		}

		assert_approx_eq!(average.value().x, 3., 1e-9);
		assert_approx_eq!(average.value().y, 4., 1e-9);
		assert_approx_eq!(average.value().z, -12., 1e-9);
	}

	#[test]
	fn alpha_one_tracks_input() {
		let mut average = ExponentialAverage::with_state(0.5, Vector3::new(1., 1., 1.));
		average.set_alpha(1.0);

		let y = average.update(&Vector3::new(7., 8., 9.));
		assert_eq!(y, Vector3::new(7., 8., 9.));
	}

	#[test]
	fn alpha_zero_holds_state() {
		let mut average = ExponentialAverage::with_state(0., Vector3::new(1., 2., 3.));

		let y = average.update(&Vector3::new(7., 8., 9.));
		assert_eq!(y, Vector3::new(1., 2., 3.));
	}
}
