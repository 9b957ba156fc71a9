//! Quaternion helpers and nalgebra extensions for the orientation filter
//!
//! The filter works on raw [`Quaternion<f64>`] values because the fusion step
//! adds and scales quaternions, which leaves the unit sphere. Hamilton
//! product, scalar multiply, addition and conjugate come from nalgebra; this
//! module adds the conversions the swing pipeline needs.

use nalgebra::{Matrix3, Quaternion, Vector3};

use crate::error::{Error, Result};

/// Mathematical constants
pub const DEG_TO_RAD: f64 = core::f64::consts::PI / 180.0;
pub const RAD_TO_DEG: f64 = 180.0 / core::f64::consts::PI;

/// Build a quaternion from `[q0, q1, q2, q3]` components.
///
/// This is the only place an operand of the wrong shape can reach the
/// algebra, everything else is checked by the type system.
///
/// # Example
/// ```
/// use swing_fusion::quaternion_from_slice;
///
/// let q = quaternion_from_slice(&[1.0, 0.0, 0.0, 0.0]).unwrap();
/// assert_eq!(q.w, 1.0);
/// assert!(quaternion_from_slice(&[1.0, 0.0, 0.0]).is_err());
/// ```
pub fn quaternion_from_slice(components: &[f64]) -> Result<Quaternion<f64>> {
    match components {
        [q0, q1, q2, q3] => Ok(Quaternion::new(*q0, *q1, *q2, *q3)),
        _ => Err(Error::InvalidOperand(components.len())),
    }
}

/// Quaternion `(cos(angle/2), axis * sin(angle/2))`.
///
/// `axis` is used as given. Callers that pass a cross product rely on its
/// magnitude being `sin(angle)`, so it must not be normalized here.
pub fn axis_angle(axis: &Vector3<f64>, angle: f64) -> Quaternion<f64> {
    let half = 0.5 * angle;
    Quaternion::from_parts(half.cos(), axis * half.sin())
}

/// Extension trait for raw quaternion conversions
pub trait QuaternionExt {
    /// Standard quaternion to 3x3 rotation matrix. Only orthonormal for unit input.
    fn rotation_matrix(&self) -> Matrix3<f64>;

    /// Euler angles (roll, pitch, yaw) in radians.
    ///
    /// Pitch saturates at ±π/2 instead of producing NaN near gimbal lock.
    fn euler_xyz(&self) -> Vector3<f64>;

    /// Rotate `v` by `q * (0, v) * q*`, returning the vector part
    fn rotate_vector(&self, v: &Vector3<f64>) -> Vector3<f64>;
}

impl QuaternionExt for Quaternion<f64> {
    fn rotation_matrix(&self) -> Matrix3<f64> {
        let (w, x, y, z) = (self.w, self.i, self.j, self.k);
        Matrix3::new(
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - z * w),
            2.0 * (x * z + y * w),
            2.0 * (x * y + z * w),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - x * w),
            2.0 * (x * z - y * w),
            2.0 * (y * z + x * w),
            1.0 - 2.0 * (x * x + y * y),
        )
    }

    fn euler_xyz(&self) -> Vector3<f64> {
        let (w, x, y, z) = (self.w, self.i, self.j, self.k);

        let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));

        let sin_pitch = 2.0 * (w * y - z * x);
        let pitch = if sin_pitch.abs() >= 1.0 {
            core::f64::consts::FRAC_PI_2.copysign(sin_pitch)
        } else {
            sin_pitch.asin()
        };

        let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));

        Vector3::new(roll, pitch, yaw)
    }

    fn rotate_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let pure = Quaternion::from_parts(0.0, *v);
        (self * pure * self.conjugate()).imag()
    }
}

/// Euler angles (roll, pitch, yaw) of a rotation matrix, using the same
/// convention and pitch clamping as [`QuaternionExt::euler_xyz`].
pub fn matrix_euler_xyz(r: &Matrix3<f64>) -> Vector3<f64> {
    let roll = r[(2, 1)].atan2(r[(2, 2)]);
    let sin_pitch = -r[(2, 0)];
    let pitch = if sin_pitch.abs() >= 1.0 {
        core::f64::consts::FRAC_PI_2.copysign(sin_pitch)
    } else {
        sin_pitch.asin()
    };
    let yaw = r[(1, 0)].atan2(r[(0, 0)]);
    Vector3::new(roll, pitch, yaw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    fn unit(w: f64, x: f64, y: f64, z: f64) -> Quaternion<f64> {
        Quaternion::new(w, x, y, z).normalize()
    }

    #[test]
    fn test_multiply_is_associative() {
        let p = unit(0.9, 0.1, -0.3, 0.2);
        let q = unit(0.2, 0.7, 0.1, -0.4);
        let r = unit(-0.5, 0.3, 0.6, 0.1);

        let left = (p * q) * r;
        let right = p * (q * r);
        assert_relative_eq!(left.coords, right.coords, epsilon = 1e-12);
    }

    #[test]
    fn test_multiply_is_not_commutative() {
        let p = unit(0.9, 0.1, -0.3, 0.2);
        let q = unit(0.2, 0.7, 0.1, -0.4);
        assert!(((p * q).coords - (q * p).coords).norm() > 1e-3);
    }

    #[test]
    fn test_conjugate_negates_vector_part() {
        let q = Quaternion::new(1.0, 2.0, 3.0, 4.0);
        let c = q.conjugate();
        assert_eq!(c.w, 1.0);
        assert_eq!(c.imag(), Vector3::new(-2.0, -3.0, -4.0));
    }

    #[test]
    fn test_rotation_matrix_is_orthonormal() {
        let q = unit(0.3, -0.4, 0.8, 0.2);
        let r = q.rotation_matrix();
        assert_relative_eq!(r.transpose() * r, Matrix3::identity(), epsilon = 1e-12);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_matrix_matches_nalgebra() {
        let q = unit(0.3, -0.4, 0.8, 0.2);
        let expected = UnitQuaternion::from_quaternion(q).to_rotation_matrix();
        assert_relative_eq!(q.rotation_matrix(), *expected.matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_vector_matches_matrix() {
        let q = unit(0.6, 0.1, -0.7, 0.3);
        let v = Vector3::new(0.0, -1.0, 0.0);
        assert_relative_eq!(q.rotate_vector(&v), q.rotation_matrix() * v, epsilon = 1e-12);
    }

    #[test]
    fn test_euler_round_trip() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.5, 1.2);
        let euler = q.euler_xyz();
        assert_relative_eq!(euler, Vector3::new(0.3, -0.5, 1.2), epsilon = 1e-12);
        assert_relative_eq!(matrix_euler_xyz(&q.rotation_matrix()), euler, epsilon = 1e-12);
    }

    #[test]
    fn test_euler_pitch_clamped_at_gimbal_lock() {
        // 90 degrees about Y, slightly denormalized so sin(pitch) exceeds 1
        let half = core::f64::consts::FRAC_PI_4;
        let q = Quaternion::new(half.cos(), 0.0, half.sin(), 0.0) * (1.0 + 1e-9);
        let euler = q.euler_xyz();
        assert!(!euler.y.is_nan());
        assert_relative_eq!(euler.y, core::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_axis_angle_keeps_axis_scale() {
        let axis = Vector3::new(0.0, 0.0, 0.5);
        let q = axis_angle(&axis, core::f64::consts::PI);
        assert_relative_eq!(q.w, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.k, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_quaternion_from_slice_rejects_wrong_length() {
        assert_eq!(
            quaternion_from_slice(&[1.0, 2.0]),
            Err(Error::InvalidOperand(2))
        );
        assert!(quaternion_from_slice(&[1.0, 0.0, 0.0, 0.0]).is_ok());
    }
}
