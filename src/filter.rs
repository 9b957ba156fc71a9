//! Quaternion complementary filter for one swing window

use log::debug;
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use crate::chart::renormalize;
use crate::error::{Error, Result};
use crate::quaternion::{DEG_TO_RAD, QuaternionExt, axis_angle};
use crate::types::{FilterSettings, SwingWindow, check_samples};

/// Complementary filter fusing gyroscope integration with accelerometer tilt.
///
/// Each window is processed independently: the first accelerometer sample
/// seeds the orientation, then every following sample blends the
/// gyro-propagated estimate with the tilt implied by the accelerometer. The
/// blend weight peaks when the measured acceleration is close to 1 g and
/// falls off during high dynamic acceleration such as an impact.
///
/// The filter holds no per-window state, so one instance can be shared by
/// any number of threads.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use swing_fusion::{FilterSettings, OrientationFilter, SwingWindow};
///
/// let filter = OrientationFilter::new(FilterSettings::default()).unwrap();
/// let window = SwingWindow::new(
///     vec![0.0, 0.01, 0.02],
///     vec![Vector3::new(0.0, 0.0, -1.0); 3],
///     vec![Vector3::zeros(); 3],
///     1,
/// );
/// let sequence = filter.apply(&window).unwrap();
/// assert_eq!(sequence.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct OrientationFilter {
    settings: FilterSettings,
    /// Unit reference direction in the working frame
    reference: Vector3<f64>,
}

impl OrientationFilter {
    pub fn new(settings: FilterSettings) -> Result<Self> {
        settings.validate()?;
        let reference = settings.alignment.apply(&settings.reference).normalize();
        if settings.debug {
            debug!("filter reference in working frame: {reference:?}");
        }
        Ok(Self {
            settings,
            reference,
        })
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Reference "down" direction in the working frame
    pub fn reference(&self) -> Vector3<f64> {
        self.reference
    }

    /// Orientation implied by a single accelerometer sample in sensor axes
    pub fn initial_orientation(&self, accel: &Vector3<f64>) -> Result<UnitQuaternion<f64>> {
        let (tilt, _) = self.tilt(&self.settings.alignment.apply(accel))?;
        renormalize(&tilt)
    }

    /// Accelerometer trust for a measured magnitude in g
    pub fn accel_weight(&self, magnitude: f64) -> f64 {
        let deviation = (magnitude - 1.0) / self.settings.accel_distro;
        self.settings.accel_ratio * (-0.5 * deviation * deviation).exp()
    }

    /// Advance `previous` by one sample.
    ///
    /// `gyro` (deg/s) and `accel` (g) are the sensor-axes readings of the new
    /// sample, `dt` the time since the previous one.
    pub fn step(
        &self,
        previous: &UnitQuaternion<f64>,
        gyro: &Vector3<f64>,
        accel: &Vector3<f64>,
        dt: f64,
    ) -> Result<UnitQuaternion<f64>> {
        let omega = self.settings.alignment.apply(gyro) * DEG_TO_RAD;
        let rate = omega.norm();
        let delta = if rate == 0.0 {
            Quaternion::identity()
        } else {
            axis_angle(&(omega / rate), rate * dt)
        };

        // Body-frame integration
        let gyro_estimate = previous.as_ref() * delta;

        let (accel_estimate, magnitude) = self.tilt(&self.settings.alignment.apply(accel))?;
        let weight = self.accel_weight(magnitude);

        let fused = gyro_estimate * (1.0 - weight) + accel_estimate * weight;
        let next = renormalize(&fused)?;

        if self.settings.debug {
            debug!(
                "omega={omega:?} accel_magnitude={magnitude:.4} weight={weight:.4} \
                 gyro_q={gyro_estimate:?} accel_q={accel_estimate:?} fused={fused:?} q={next:?}"
            );
        }

        Ok(next)
    }

    /// Run the filter over a whole window.
    ///
    /// Sample `i + 1` depends on sample `i`, so this is a strict left fold;
    /// the returned sequence has one orientation per window sample.
    pub fn apply(&self, window: &SwingWindow) -> Result<OrientationSequence> {
        check_window(window)?;

        let time = window.time();
        let accel = window.accel();
        let gyro = window.gyro();

        let first = self.initial_orientation(&accel[0])?;
        let mut seed = Vec::with_capacity(window.len());
        seed.push(first);

        let orientations = (1..window.len()).try_fold(seed, |mut sequence, i| {
            let previous = sequence[i - 1];
            let next = self.step(&previous, &gyro[i], &accel[i], time[i] - time[i - 1])?;
            sequence.push(next);
            Ok::<_, Error>(sequence)
        })?;

        Ok(OrientationSequence { orientations })
    }

    /// Tilt quaternion rotating the reference onto `accel` (working frame),
    /// together with the measured magnitude.
    ///
    /// The rotation axis is the raw cross product, whose magnitude is
    /// `sin(angle)`, so the result is generally not unit norm.
    fn tilt(&self, accel: &Vector3<f64>) -> Result<(Quaternion<f64>, f64)> {
        let magnitude = accel.norm();
        if magnitude == 0.0 {
            return Err(Error::Degenerate("zero accelerometer magnitude"));
        }
        let direction = accel / magnitude;
        let angle = self.reference.dot(&direction).clamp(-1.0, 1.0).acos();
        let axis = self.reference.cross(&direction);
        Ok((axis_angle(&axis, angle), magnitude))
    }
}

fn check_window(window: &SwingWindow) -> Result<()> {
    if window.is_empty() {
        return Err(Error::InvalidWindow("window has no samples".into()));
    }
    check_samples(window.time(), window.accel(), window.gyro()).map_err(Error::InvalidWindow)
}

/// Orientation of every sample of one window, in sample order
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationSequence {
    orientations: Vec<UnitQuaternion<f64>>,
}

impl OrientationSequence {
    pub fn len(&self) -> usize {
        self.orientations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orientations.is_empty()
    }

    pub fn orientations(&self) -> &[UnitQuaternion<f64>] {
        &self.orientations
    }

    /// Row-major rotation matrix for every orientation
    pub fn rotation_matrices(&self) -> Vec<Matrix3<f64>> {
        self.orientations.iter().map(|q| q.rotation_matrix()).collect()
    }

    pub fn into_inner(self) -> Vec<UnitQuaternion<f64>> {
        self.orientations
    }
}
