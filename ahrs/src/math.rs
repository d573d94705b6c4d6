//! Vector and quaternion helpers missing from nalgebra.
//!
//! Euler angles are stored in a `Vector3` as (roll, pitch, yaw), using the aerospace Z-Y-X
//! convention. Quaternion components are indexed as (scalar, x, y, z).

use nalgebra::{Quaternion, Vector3};

pub trait VectorExt {
	/// Scales the vector to unit length. Zero and unit vectors are returned unchanged.
	fn safe_normalize(&self) -> Self;

	/// Roll and pitch of the body given the direction of gravity. Yaw is not observable and is 0.
	fn accel_to_euler(&self) -> Vector3<f64>;

	/// Shortest rotation bringing the measured gravity direction onto the z axis.
	fn accel_to_quaternion(&self) -> Quaternion<f64>;
}

impl VectorExt for Vector3<f64> {
	fn safe_normalize(&self) -> Self {
		let length = self.norm();

		if length == 0. || length == 1. {
			*self
		} else {
			self.unscale(length)
		}
	}

	fn accel_to_euler(&self) -> Vector3<f64> {
		let a = self.safe_normalize();

		Vector3::new(
			a.y.atan2(a.z),
			-a.x.atan2((a.y * a.y + a.z * a.z).sqrt()),
			0.,
		)
	}

	fn accel_to_quaternion(&self) -> Quaternion<f64> {
		let a = self.safe_normalize();
		let z = Vector3::z();

		let angle = clamp_unit(z.dot(&a)).acos();
		let axis = a.cross(&z).safe_normalize();

		Quaternion::from_angle_vector(angle, &axis)
	}
}

pub trait QuaternionExt: Sized {
	fn from_euler(euler: &Vector3<f64>) -> Self;

	fn to_euler(&self) -> Vector3<f64>;

	fn from_angle_vector(angle: f64, axis: &Vector3<f64>) -> Self;

	/// Rotation angle and axis. The axis defaults to x for a null rotation.
	fn to_angle_vector(&self) -> (f64, Vector3<f64>);

	/// Scales the quaternion to unit norm. Zero and unit quaternions are returned unchanged.
	fn safe_normalize(&self) -> Self;

	/// Component `index` in (scalar, x, y, z) order.
	fn component(&self, index: usize) -> f64;

	/// Index of the component with the largest magnitude. The first one wins on ties.
	fn dominant_component(&self) -> usize;

	/// Applies the rotation to `v` (`q * v * q'`).
	fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64>;
}

impl QuaternionExt for Quaternion<f64> {
	fn from_euler(euler: &Vector3<f64>) -> Self {
		let (sin_x2, cos_x2) = (euler.x / 2.).sin_cos();
		let (sin_y2, cos_y2) = (euler.y / 2.).sin_cos();
		let (sin_z2, cos_z2) = (euler.z / 2.).sin_cos();

		#[rustfmt::skip]
		let q = Quaternion::new(
			cos_x2 * cos_y2 * cos_z2 + sin_x2 * sin_y2 * sin_z2,
			sin_x2 * cos_y2 * cos_z2 - cos_x2 * sin_y2 * sin_z2,
			cos_x2 * sin_y2 * cos_z2 + sin_x2 * cos_y2 * sin_z2,
			cos_x2 * cos_y2 * sin_z2 - sin_x2 * sin_y2 * cos_z2,
		);

		q.safe_normalize()
	}

	fn to_euler(&self) -> Vector3<f64> {
		let (s, x, y, z) = (self.w, self.i, self.j, self.k);

		Vector3::new(
			(2. * (y * z + s * x)).atan2(1. - 2. * (x * x + y * y)),
			clamp_unit(2. * (s * y - x * z)).asin(),
			(2. * (x * y + s * z)).atan2(1. - 2. * (y * y + z * z)),
		)
	}

	fn from_angle_vector(angle: f64, axis: &Vector3<f64>) -> Self {
		let (sin_half, cos_half) = (angle / 2.).sin_cos();

		Quaternion::from_parts(cos_half, axis * sin_half)
	}

	fn to_angle_vector(&self) -> (f64, Vector3<f64>) {
		let half_theta = clamp_unit(self.w).acos();
		let sin_half_theta = half_theta.sin();

		let axis = if sin_half_theta == 0. {
			Vector3::x()
		} else {
			self.imag().unscale(sin_half_theta)
		};

		(2. * half_theta, axis)
	}

	fn safe_normalize(&self) -> Self {
		let length = self.norm();

		if length == 0. || length == 1. {
			*self
		} else {
			*self / length
		}
	}

	fn component(&self, index: usize) -> f64 {
		match index {
			0 => self.w,
			1 => self.i,
			2 => self.j,
			_ => self.k,
		}
	}

	fn dominant_component(&self) -> usize {
		let mut index = 0;

		for i in 1..4 {
			if self.component(i).abs() > self.component(index).abs() {
				index = i;
			}
		}

		index
	}

	fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
		(self * Quaternion::from_parts(0., *v) * self.conjugate()).imag()
	}
}

/// Roll and pitch from the accelerometer, tilt compensated heading from the magnetometer.
pub fn pose_from_accel_mag(accel: &Vector3<f64>, mag: &Vector3<f64>) -> Vector3<f64> {
	let mut pose = accel.accel_to_euler();

	let tilt: Quaternion<f64> = Quaternion::from_euler(&pose);
	let horizontal = tilt.rotate(mag);
	pose.z = -horizontal.y.atan2(horizontal.x);

	pose
}

/// Keeps rounding errors from pushing `asin`/`acos` arguments out of their domain.
#[inline(always)]
fn clamp_unit(value: f64) -> f64 {
	value.max(-1.).min(1.)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::f64::consts::{FRAC_PI_2, PI};

	#[test]
	fn normalize_zero_vector() {
		let v = Vector3::<f64>::zeros();
		assert_eq!(v.safe_normalize(), v);

		let q = Quaternion::<f64>::new(0., 0., 0., 0.);
		assert_eq!(q.safe_normalize(), q);
	}

	#[test]
	fn normalize_unit_vector_is_exact() {
		let v = Vector3::new(0., 1., 0.);
		assert_eq!(v.safe_normalize(), v);
	}

	#[test]
	fn accel_to_euler_level() {
		let euler = Vector3::new(0., 0., 1.).accel_to_euler();

		assert_approx_eq!(euler.x, 0.);
		assert_approx_eq!(euler.y, 0.);
		assert_approx_eq!(euler.z, 0.);
	}

	#[test]
	fn accel_to_euler_ignores_magnitude() {
		let a = Vector3::new(0.3, -0.2, 0.9).accel_to_euler();
		let b = Vector3::new(3., -2., 9.).accel_to_euler();

		assert_approx_eq!(a.x, b.x);
		assert_approx_eq!(a.y, b.y);
	}

	#[test]
	fn accel_to_euler_on_side() {
		let euler = Vector3::new(0., 1., 0.).accel_to_euler();
		assert_approx_eq!(euler.x, FRAC_PI_2);

		let euler = Vector3::new(-1., 0., 0.).accel_to_euler();
		assert_approx_eq!(euler.y, FRAC_PI_2);
	}

	#[test]
	fn accel_to_quaternion_level_is_identity() {
		let q = Vector3::new(0., 0., 0.98).accel_to_quaternion();

		assert_approx_eq!(q.w, 1.);
		assert_approx_eq!(q.imag().norm(), 0.);
	}

	#[test]
	fn accel_to_quaternion_maps_gravity_on_z() {
		let accel = Vector3::new(0.2, -0.5, 0.7);
		let rotated = accel.accel_to_quaternion().rotate(&accel.safe_normalize());

		assert_approx_eq!(rotated.x, 0.);
		assert_approx_eq!(rotated.y, 0.);
		assert_approx_eq!(rotated.z, 1.);
	}

	#[test]
	fn from_euler_yaw_only() {
		let q: Quaternion<f64> = Quaternion::from_euler(&Vector3::new(0., 0., PI / 3.));

		assert_approx_eq!(q.w, (PI / 6.).cos());
		assert_approx_eq!(q.i, 0.);
		assert_approx_eq!(q.j, 0.);
		assert_approx_eq!(q.k, (PI / 6.).sin());
	}

	#[test]
	fn angle_vector_round_trip() {
		let axis = Vector3::new(1., 2., -2.).safe_normalize();
		let q: Quaternion<f64> = Quaternion::from_angle_vector(1.2, &axis);
		let (angle, result) = q.to_angle_vector();

		assert_approx_eq!(angle, 1.2);
		assert_approx_eq!(result.x, axis.x);
		assert_approx_eq!(result.y, axis.y);
		assert_approx_eq!(result.z, axis.z);
	}

	#[test]
	fn angle_vector_of_identity() {
		let (angle, axis) = Quaternion::new(1f64, 0., 0., 0.).to_angle_vector();

		assert_eq!(angle, 0.);
		assert_eq!(axis, Vector3::x());
	}

	#[test]
	fn dominant_component_first_wins() {
		assert_eq!(Quaternion::new(0.5f64, -0.5, 0.5, 0.5).dominant_component(), 0);
		assert_eq!(Quaternion::new(0.1f64, -0.7, 0.7, 0.).dominant_component(), 1);
		assert_eq!(Quaternion::new(0.1f64, 0.2, 0.3, -0.9).dominant_component(), 3);
	}

	#[test]
	fn pose_from_accel_mag_heading() {
		let yaw = 0.7f64;
		let mag = Vector3::new(yaw.cos(), -yaw.sin(), 0.4);
		let pose = pose_from_accel_mag(&Vector3::new(0., 0., 1.), &mag);

		assert_approx_eq!(pose.x, 0.);
		assert_approx_eq!(pose.y, 0.);
		assert_approx_eq!(pose.z, yaw);
	}
}
