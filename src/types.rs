//! Core types and settings for the swing pipeline

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::axes::AxesRemap;
use crate::error::{Error, Result};

/// Seconds per logger timestamp tick
pub const TICK_SECONDS: f64 = 0.122e-3;

/// One timestamped accelerometer/gyroscope sample.
///
/// Serde names follow the logger's column names, so a CSV file with a header
/// row deserializes directly and extra columns such as the baseline and
/// impact level channels are ignored. Raw headerless logger files go through
/// [`read_logger_csv`](crate::read_logger_csv).
///
/// # Example
/// ```
/// use swing_fusion::{SensorRecord, SensorStream};
///
/// let rows = [
///     SensorRecord { timestamp: 1000, accel_x: 0.0, accel_y: 0.0, accel_z: -1.0, gyro_x: 0.0, gyro_y: 0.0, gyro_z: 0.0 },
///     SensorRecord { timestamp: 1082, accel_x: 0.0, accel_y: 0.0, accel_z: -1.0, gyro_x: 0.0, gyro_y: 0.0, gyro_z: 0.0 },
/// ];
/// let stream = SensorStream::from_records(&rows).unwrap();
/// assert_eq!(stream.time()[0], 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Logger clock ticks
    pub timestamp: i64,
    /// Accelerometer X in g
    #[serde(rename = "accelX")]
    pub accel_x: f64,
    /// Accelerometer Y in g
    #[serde(rename = "accelY")]
    pub accel_y: f64,
    /// Accelerometer Z in g
    #[serde(rename = "accelZ")]
    pub accel_z: f64,
    /// Gyroscope X in deg/s
    #[serde(rename = "gyroX")]
    pub gyro_x: f64,
    /// Gyroscope Y in deg/s
    #[serde(rename = "gyroY")]
    pub gyro_y: f64,
    /// Gyroscope Z in deg/s
    #[serde(rename = "gyroZ")]
    pub gyro_z: f64,
}

/// Synchronized accelerometer/gyroscope recording.
///
/// Time is in seconds and strictly increasing, accelerometer in g and
/// gyroscope in deg/s, all in sensor axes.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorStream {
    time: Vec<f64>,
    accel: Vec<Vector3<f64>>,
    gyro: Vec<Vector3<f64>>,
}

impl SensorStream {
    /// Build a stream from equal-length channels
    pub fn new(time: Vec<f64>, accel: Vec<Vector3<f64>>, gyro: Vec<Vector3<f64>>) -> Result<Self> {
        check_samples(&time, &accel, &gyro).map_err(Error::InvalidStream)?;
        Ok(Self { time, accel, gyro })
    }

    /// Convert logger rows, rebasing timestamps to zero at the first row
    pub fn from_records(records: &[SensorRecord]) -> Result<Self> {
        let origin = records.first().map_or(0, |r| r.timestamp);
        let time = records
            .iter()
            .map(|r| (r.timestamp - origin) as f64 * TICK_SECONDS)
            .collect();
        let accel = records
            .iter()
            .map(|r| Vector3::new(r.accel_x, r.accel_y, r.accel_z))
            .collect();
        let gyro = records
            .iter()
            .map(|r| Vector3::new(r.gyro_x, r.gyro_y, r.gyro_z))
            .collect();
        Self::new(time, accel, gyro)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn accel(&self) -> &[Vector3<f64>] {
        &self.accel
    }

    pub fn gyro(&self) -> &[Vector3<f64>] {
        &self.gyro
    }

    /// Mean of consecutive time deltas, `None` with fewer than two samples
    pub fn average_dt(&self) -> Option<f64> {
        let n = self.time.len();
        if n < 2 {
            return None;
        }
        Some((self.time[n - 1] - self.time[0]) / (n - 1) as f64)
    }

    /// Copy samples `start..end` into a window anchored on stream sample `impact_index`
    pub(crate) fn window(&self, start: usize, end: usize, impact_index: usize) -> SwingWindow {
        SwingWindow::from_parts(
            self.time[start..end].to_vec(),
            self.accel[start..end].to_vec(),
            self.gyro[start..end].to_vec(),
            impact_index,
            impact_index - start - 1,
        )
    }
}

/// Channel lengths agree, every value is finite and time strictly increases
pub(crate) fn check_samples(
    time: &[f64],
    accel: &[Vector3<f64>],
    gyro: &[Vector3<f64>],
) -> core::result::Result<(), String> {
    if time.len() != accel.len() || time.len() != gyro.len() {
        return Err(format!(
            "channel lengths differ: time {}, accel {}, gyro {}",
            time.len(),
            accel.len(),
            gyro.len()
        ));
    }
    if let Some(i) = time.iter().position(|t| !t.is_finite()) {
        return Err(format!("non-finite timestamp at sample {i}"));
    }
    if let Some(i) = (0..time.len()).position(|i| {
        !accel[i].iter().all(|v| v.is_finite()) || !gyro[i].iter().all(|v| v.is_finite())
    }) {
        return Err(format!("non-finite sensor reading at sample {i}"));
    }
    if let Some(i) = time.windows(2).position(|t| t[1] <= t[0]) {
        return Err(format!("time is not strictly increasing at sample {}", i + 1));
    }
    Ok(())
}

/// Fixed-duration slice of a stream around one detected impact.
#[derive(Debug, Clone, PartialEq)]
pub struct SwingWindow {
    time: Vec<f64>,
    accel: Vec<Vector3<f64>>,
    accel_magnitude: Vec<f64>,
    gyro: Vec<Vector3<f64>>,
    gyro_magnitude: Vec<f64>,
    impact_index: usize,
    local_impact_index: usize,
}

impl SwingWindow {
    /// Build a window from raw channels.
    ///
    /// Lengths, finiteness and time ordering are checked when the window is
    /// filtered, so hand-built windows can still be used to exercise those
    /// errors.
    pub fn new(
        time: Vec<f64>,
        accel: Vec<Vector3<f64>>,
        gyro: Vec<Vector3<f64>>,
        local_impact_index: usize,
    ) -> Self {
        Self::from_parts(time, accel, gyro, local_impact_index, local_impact_index)
    }

    fn from_parts(
        time: Vec<f64>,
        accel: Vec<Vector3<f64>>,
        gyro: Vec<Vector3<f64>>,
        impact_index: usize,
        local_impact_index: usize,
    ) -> Self {
        let accel_magnitude = accel.iter().map(|a| a.norm()).collect();
        let gyro_magnitude = gyro.iter().map(|g| g.norm()).collect();
        Self {
            time,
            accel,
            accel_magnitude,
            gyro,
            gyro_magnitude,
            impact_index,
            local_impact_index,
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn accel(&self) -> &[Vector3<f64>] {
        &self.accel
    }

    pub fn accel_magnitude(&self) -> &[f64] {
        &self.accel_magnitude
    }

    pub fn gyro(&self) -> &[Vector3<f64>] {
        &self.gyro
    }

    pub fn gyro_magnitude(&self) -> &[f64] {
        &self.gyro_magnitude
    }

    /// Impact position in the source stream
    pub fn impact_index(&self) -> usize {
        self.impact_index
    }

    /// Impact position inside this window
    pub fn local_impact_index(&self) -> usize {
        self.local_impact_index
    }
}

/// Orientation filter settings
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use swing_fusion::FilterSettings;
///
/// let settings = FilterSettings {
///     reference: Vector3::new(0.0, 0.0, -1.0), // gravity along sensor -Z at address
///     accel_ratio: 0.3,                         // trust the accelerometer less
///     ..Default::default()
/// };
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Reference "down" direction in sensor axes
    ///
    /// Remapped into the working frame once, when the filter is built.
    pub reference: Vector3<f64>,
    /// Maximum accelerometer trust in `[0, 1]`
    ///
    /// Zero turns the filter into pure gyroscope integration.
    pub accel_ratio: f64,
    /// Width of the trust fall-off around 1 g, must be positive
    pub accel_distro: f64,
    /// Trace every filter step at debug level
    pub debug: bool,
    /// Sensor to working frame remap
    pub alignment: AxesRemap,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            reference: Vector3::new(0.0, 0.0, -1.0),
            accel_ratio: 0.5,
            accel_distro: 0.25,
            debug: false,
            alignment: AxesRemap::WORKING_FRAME,
        }
    }
}

impl FilterSettings {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.accel_ratio) {
            return Err(Error::InvalidSettings(format!(
                "accel_ratio {} outside [0, 1]",
                self.accel_ratio
            )));
        }
        if !(self.accel_distro > 0.0 && self.accel_distro.is_finite()) {
            return Err(Error::InvalidSettings(format!(
                "accel_distro {} must be positive",
                self.accel_distro
            )));
        }
        let norm = self.reference.norm();
        if !(norm > 0.0 && norm.is_finite()) {
            return Err(Error::InvalidSettings(
                "reference direction must be a finite nonzero vector".into(),
            ));
        }
        self.alignment.validate()
    }
}

/// Swing segmentation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Physical span of a swing window in seconds
    pub window_seconds: f64,
    /// Minimum peak prominence on the magnitude signals
    pub min_prominence: f64,
    /// Minimum peak height as a fraction of the signal maximum
    pub relative_height: f64,
    /// Drop peaks with no correlated partner instead of failing
    pub skip_unmatched: bool,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            window_seconds: 5.0,
            min_prominence: 1.0,
            relative_height: 0.4,
            skip_unmatched: false,
        }
    }
}

impl SegmentationSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.window_seconds > 0.0 && self.window_seconds.is_finite()) {
            return Err(Error::InvalidSettings(format!(
                "window_seconds {} must be positive",
                self.window_seconds
            )));
        }
        if self.min_prominence < 0.0 {
            return Err(Error::InvalidSettings(format!(
                "min_prominence {} must not be negative",
                self.min_prominence
            )));
        }
        if !(0.0..=1.0).contains(&self.relative_height) {
            return Err(Error::InvalidSettings(format!(
                "relative_height {} outside [0, 1]",
                self.relative_height
            )));
        }
        Ok(())
    }
}

/// Kinematic derivation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicSettings {
    /// Shoulder width of the player, in the unit the yaw speed should carry
    pub shoulder_width: f64,
    /// Shaft "down" direction in the working frame
    pub down_reference: Vector3<f64>,
    /// Axis the rotated shaft is measured against
    pub lateral_axis: Vector3<f64>,
}

impl Default for KinematicSettings {
    fn default() -> Self {
        Self {
            shoulder_width: 0.45,
            down_reference: Vector3::new(0.0, -1.0, 0.0),
            lateral_axis: Vector3::new(1.0, 0.0, 0.0),
        }
    }
}

impl KinematicSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.shoulder_width > 0.0 && self.shoulder_width.is_finite()) {
            return Err(Error::InvalidSettings(format!(
                "shoulder_width {} must be positive",
                self.shoulder_width
            )));
        }
        if self.down_reference.norm() == 0.0 || self.lateral_axis.norm() == 0.0 {
            return Err(Error::InvalidSettings(
                "kinematic reference vectors must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: i64) -> SensorRecord {
        SensorRecord {
            timestamp,
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: -1.0,
            gyro_x: 1.0,
            gyro_y: 2.0,
            gyro_z: 3.0,
        }
    }

    #[test]
    fn test_from_records_rebases_ticks() {
        let stream = SensorStream::from_records(&[record(5000), record(5082), record(5164)]).unwrap();
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.time()[0], 0.0);
        assert!((stream.time()[1] - 82.0 * TICK_SECONDS).abs() < 1e-12);
        assert!((stream.time()[2] - 164.0 * TICK_SECONDS).abs() < 1e-12);
        assert_eq!(stream.gyro()[0], Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_stream_rejects_mismatched_lengths() {
        let result = SensorStream::new(vec![0.0, 1.0], vec![Vector3::zeros()], vec![Vector3::zeros(); 2]);
        assert!(matches!(result, Err(Error::InvalidStream(_))));
    }

    #[test]
    fn test_stream_rejects_non_increasing_time() {
        let result = SensorStream::from_records(&[record(10), record(10)]);
        assert!(matches!(result, Err(Error::InvalidStream(_))));
    }

    #[test]
    fn test_stream_rejects_nan_time() {
        let result = SensorStream::new(
            vec![0.0, f64::NAN, 0.02],
            vec![Vector3::new(0.0, 0.0, -1.0); 3],
            vec![Vector3::zeros(); 3],
        );
        assert!(matches!(result, Err(Error::InvalidStream(_))));
    }

    #[test]
    fn test_stream_rejects_non_finite_readings() {
        let mut accel = vec![Vector3::new(0.0, 0.0, -1.0); 3];
        accel[1].x = f64::INFINITY;
        let result = SensorStream::new(vec![0.0, 0.01, 0.02], accel, vec![Vector3::zeros(); 3]);
        assert!(matches!(result, Err(Error::InvalidStream(_))));

        let mut gyro = vec![Vector3::zeros(); 3];
        gyro[2].z = f64::NAN;
        let result = SensorStream::new(
            vec![0.0, 0.01, 0.02],
            vec![Vector3::new(0.0, 0.0, -1.0); 3],
            gyro,
        );
        assert!(matches!(result, Err(Error::InvalidStream(_))));
    }

    #[test]
    fn test_average_dt() {
        let stream = SensorStream::new(
            vec![0.0, 0.1, 0.3],
            vec![Vector3::zeros(); 3],
            vec![Vector3::zeros(); 3],
        )
        .unwrap();
        assert!((stream.average_dt().unwrap() - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_window_magnitudes() {
        let window = SwingWindow::new(
            vec![0.0, 0.01],
            vec![Vector3::new(3.0, 4.0, 0.0), Vector3::new(0.0, 0.0, 1.0)],
            vec![Vector3::new(0.0, 6.0, 8.0), Vector3::zeros()],
            0,
        );
        assert_eq!(window.accel_magnitude(), &[5.0, 1.0]);
        assert_eq!(window.gyro_magnitude(), &[10.0, 0.0]);
    }

    #[test]
    fn test_filter_settings_validation() {
        assert!(FilterSettings::default().validate().is_ok());
        let bad_ratio = FilterSettings {
            accel_ratio: 1.5,
            ..Default::default()
        };
        assert!(bad_ratio.validate().is_err());
        let bad_distro = FilterSettings {
            accel_distro: 0.0,
            ..Default::default()
        };
        assert!(bad_distro.validate().is_err());
        let bad_reference = FilterSettings {
            reference: Vector3::zeros(),
            ..Default::default()
        };
        assert!(bad_reference.validate().is_err());
    }

    #[test]
    fn test_segmentation_settings_defaults() {
        let settings = SegmentationSettings::default();
        assert_eq!(settings.window_seconds, 5.0);
        assert_eq!(settings.min_prominence, 1.0);
        assert_eq!(settings.relative_height, 0.4);
        assert!(settings.validate().is_ok());
    }
}
