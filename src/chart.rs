//! Gibbs-Rodrigues chart used to blend quaternions
//!
//! A unit quaternion with a nonzero scalar part maps to the 3-vector
//! `g = 2 q / q0`. Every finite `g` maps back to a unit quaternion, so a
//! linear blend of quaternions pushed through the chart always lands on a
//! valid orientation without iterative renormalization.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::error::{Error, Result};

/// Map a quaternion to chart coordinates `2 q / q0`.
///
/// Fails with [`Error::DivideByZero`] when the scalar part is zero.
pub fn to_chart(q: &Quaternion<f64>) -> Result<Vector3<f64>> {
    if q.w == 0.0 {
        return Err(Error::DivideByZero);
    }
    Ok(q.imag() * (2.0 / q.w))
}

/// Map chart coordinates back to a unit quaternion `(2s, s g)` with
/// `s = 1 / sqrt(4 + |g|²)`.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use swing_fusion::from_chart;
///
/// let q = from_chart(&Vector3::new(100.0, -3.0, 0.5));
/// assert!((q.norm() - 1.0).abs() < 1e-12);
/// ```
pub fn from_chart(g: &Vector3<f64>) -> UnitQuaternion<f64> {
    let s = 1.0 / (4.0 + g.norm_squared()).sqrt();
    UnitQuaternion::new_unchecked(Quaternion::from_parts(2.0 * s, g * s))
}

/// Project an arbitrary quaternion onto the unit sphere through the chart.
///
/// The result always has a positive scalar part, so `q` and `-q` share one
/// representative.
pub fn renormalize(q: &Quaternion<f64>) -> Result<UnitQuaternion<f64>> {
    Ok(from_chart(&to_chart(q)?))
}
