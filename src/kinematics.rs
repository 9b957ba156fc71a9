//! Kinematic curves derived from a window's rotation matrices

use nalgebra::Matrix3;

use crate::error::{Error, Result};
use crate::quaternion::{RAD_TO_DEG, matrix_euler_xyz};
use crate::types::KinematicSettings;

/// Empirical scale from yaw rate to a linear speed proxy, per unit of shoulder width
const YAW_SPEED_SCALE: f64 = 0.005;

/// Yaw speed between consecutive samples.
///
/// `yaw_speed[i - 1] = 0.005 * shoulder_width * |yaw[i] - yaw[i - 1]| / (t[i] - t[i - 1])`,
/// so the output is one shorter than the input and aligned with `time[1..]`.
///
/// # Example
/// ```
/// use nalgebra::Matrix3;
/// use swing_fusion::kinematics::yaw_speed;
///
/// let still = vec![Matrix3::identity(); 3];
/// let speed = yaw_speed(&[0.0, 0.1, 0.2], &still, 0.45).unwrap();
/// assert_eq!(speed, vec![0.0, 0.0]);
/// ```
pub fn yaw_speed(time: &[f64], rotations: &[Matrix3<f64>], shoulder_width: f64) -> Result<Vec<f64>> {
    if time.len() != rotations.len() {
        return Err(Error::InvalidWindow(format!(
            "{} timestamps for {} rotations",
            time.len(),
            rotations.len()
        )));
    }

    let scale = YAW_SPEED_SCALE * shoulder_width;
    let yaw: Vec<f64> = rotations.iter().map(|r| matrix_euler_xyz(r).z).collect();

    time.windows(2)
        .zip(yaw.windows(2))
        .map(|(t, y)| {
            let dt = t[1] - t[0];
            if !(dt > 0.0 && dt.is_finite()) {
                return Err(Error::InvalidWindow(
                    "time is not finite and strictly increasing".into(),
                ));
            }
            Ok(scale * (y[1] - y[0]).abs() / dt)
        })
        .collect()
}

/// Swing-plane angle in degrees for every rotation.
///
/// The shaft direction `down_reference` is rotated by each matrix and its
/// angle to `lateral_axis` is reported.
pub fn swing_angle(rotations: &[Matrix3<f64>], settings: &KinematicSettings) -> Vec<f64> {
    let down = settings.down_reference.normalize();
    let lateral = settings.lateral_axis.normalize();
    rotations
        .iter()
        .map(|r| {
            let shaft = r * down;
            lateral.dot(&shaft).clamp(-1.0, 1.0).acos() * RAD_TO_DEG
        })
        .collect()
}
