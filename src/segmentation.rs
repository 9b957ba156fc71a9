//! Swing segmentation: locate impacts in a continuous recording and cut
//! fixed-duration windows around them
//!
//! An impact shows up as a peak on both the accelerometer and the gyroscope
//! magnitude. Peaks are detected on each signal independently, then every
//! peak of the sparser signal is paired with the earliest peak of the denser
//! signal within half a window. The impact index is the midpoint of the pair.

use log::{info, warn};

use crate::error::{Error, Result};
use crate::peaks::{PeakCriteria, find_peaks};
use crate::types::{SegmentationSettings, SensorStream, SwingWindow};

/// Detects swing events and extracts their windows.
///
/// # Example
/// ```
/// use swing_fusion::{SegmentationSettings, SwingSegmenter};
///
/// let segmenter = SwingSegmenter::new(SegmentationSettings::default()).unwrap();
/// assert_eq!(segmenter.window_length(0.01), 500);
/// ```
#[derive(Debug, Clone)]
pub struct SwingSegmenter {
    settings: SegmentationSettings,
}

impl SwingSegmenter {
    pub fn new(settings: SegmentationSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &SegmentationSettings {
        &self.settings
    }

    /// Window length in samples for a given mean sample period, rounded to
    /// the nearest sample
    pub fn window_length(&self, average_dt: f64) -> usize {
        (self.settings.window_seconds / average_dt).round() as usize
    }

    /// Stream indices of the detected impacts, ascending and unique
    pub fn detect_impacts(&self, stream: &SensorStream) -> Result<Vec<usize>> {
        let index_window = self.index_window(stream)?;
        let half = index_window / 2;

        let accel_magnitude: Vec<f64> = stream.accel().iter().map(|a| a.norm()).collect();
        let gyro_magnitude: Vec<f64> = stream.gyro().iter().map(|g| g.norm()).collect();

        let accel_peaks = self.peaks(&accel_magnitude, index_window);
        let gyro_peaks = self.peaks(&gyro_magnitude, index_window);
        info!(
            "found {} accelerometer and {} gyroscope peaks (window {} samples)",
            accel_peaks.len(),
            gyro_peaks.len(),
            index_window
        );

        let (larger, smaller) = if gyro_peaks.len() > accel_peaks.len() {
            (&gyro_peaks, &accel_peaks)
        } else {
            (&accel_peaks, &gyro_peaks)
        };

        let mut impacts = Vec::with_capacity(smaller.len());
        for &peak in smaller {
            let partner = larger
                .iter()
                .copied()
                .filter(|candidate| candidate.abs_diff(peak) <= half)
                .min();

            match partner {
                Some(partner) => impacts.push((peak + partner) / 2),
                None if self.settings.skip_unmatched => {
                    warn!("skipping peak at {peak}: no correlated peak within {half} samples");
                }
                None => {
                    return Err(Error::SegmentationError {
                        peak,
                        half_window: half,
                    });
                }
            }
        }

        impacts.sort_unstable();
        impacts.dedup();
        Ok(impacts)
    }

    /// Detect impacts and cut one window per impact, in time order.
    ///
    /// Each window spans `[k - half, k + half)` around impact `k`. Impacts too
    /// close to either end of the stream for a full window are skipped.
    pub fn segment(&self, stream: &SensorStream) -> Result<Vec<SwingWindow>> {
        let half = self.index_window(stream)? / 2;
        let impacts = self.detect_impacts(stream)?;

        let mut windows = Vec::with_capacity(impacts.len());
        for impact in impacts {
            if impact < half || impact + half > stream.len() {
                warn!(
                    "skipping impact at {impact}: window of {} samples overruns stream of {}",
                    2 * half,
                    stream.len()
                );
                continue;
            }
            windows.push(stream.window(impact - half, impact + half, impact));
        }

        info!("segmented {} swing windows", windows.len());
        Ok(windows)
    }

    fn index_window(&self, stream: &SensorStream) -> Result<usize> {
        let average_dt = stream
            .average_dt()
            .ok_or_else(|| Error::InvalidStream("segmentation needs at least two samples".into()))?;
        let index_window = self.window_length(average_dt);
        if index_window < 2 {
            return Err(Error::InvalidStream(format!(
                "a {} s window spans fewer than two samples",
                self.settings.window_seconds
            )));
        }
        Ok(index_window)
    }

    fn peaks(&self, signal: &[f64], index_window: usize) -> Vec<usize> {
        let max = signal.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let criteria = PeakCriteria {
            height: Some(self.settings.relative_height * max),
            distance: Some(index_window as f64),
            prominence: Some(self.settings.min_prominence),
        };
        find_peaks(signal, &criteria)
    }
}
