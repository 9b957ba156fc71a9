//! End-to-end analysis of a recording: segmentation, batch filtering and
//! kinematic derivation

use log::info;
use nalgebra::Matrix3;

use crate::batch::BatchRunner;
use crate::config::Config;
use crate::error::Result;
use crate::filter::{OrientationFilter, OrientationSequence};
use crate::kinematics::{swing_angle, yaw_speed};
use crate::segmentation::SwingSegmenter;
use crate::task::{self, TaskHandle};
use crate::types::{KinematicSettings, SensorStream, SwingWindow};

/// Everything downstream rendering and plotting needs for one swing
#[derive(Debug, Clone, PartialEq)]
pub struct SwingReport {
    /// Position of the window in the segmentation output
    pub window_id: usize,
    /// Window timestamps in seconds
    pub time: Vec<f64>,
    /// Row-major rotation matrix per sample
    pub rotations: Vec<Matrix3<f64>>,
    /// Impact position in the source stream
    pub impact_index: usize,
    /// Impact position inside the window
    pub local_impact_index: usize,
    /// Aligned with `time[1..]`
    pub yaw_speed: Vec<f64>,
    /// Degrees, aligned with `time`
    pub swing_angle: Vec<f64>,
}

impl SwingReport {
    /// Derive the kinematic curves for a filtered window
    pub fn new(
        window_id: usize,
        window: &SwingWindow,
        sequence: &OrientationSequence,
        settings: &KinematicSettings,
    ) -> Result<Self> {
        let rotations = sequence.rotation_matrices();
        let yaw_speed = yaw_speed(window.time(), &rotations, settings.shoulder_width)?;
        let swing_angle = swing_angle(&rotations, settings);
        Ok(Self {
            window_id,
            time: window.time().to_vec(),
            rotations,
            impact_index: window.impact_index(),
            local_impact_index: window.local_impact_index(),
            yaw_speed,
            swing_angle,
        })
    }
}

/// Segment `stream` and analyze every swing found.
///
/// The outer error covers the whole recording (bad settings, failed
/// segmentation). Each swing then succeeds or fails on its own.
pub fn analyze_stream(stream: &SensorStream, config: &Config) -> Result<Vec<Result<SwingReport>>> {
    config.validate()?;

    let segmenter = SwingSegmenter::new(config.segmentation)?;
    let windows = segmenter.segment(stream)?;

    let mut runner = BatchRunner::new(OrientationFilter::new(config.filter)?);
    if let Some(workers) = config.workers {
        runner = runner.with_workers(workers);
    }
    let sequences = runner.run(&windows);

    let reports: Vec<_> = windows
        .iter()
        .zip(sequences)
        .enumerate()
        .map(|(window_id, (window, sequence))| {
            SwingReport::new(window_id, window, &sequence?, &config.kinematics)
        })
        .collect();

    info!(
        "analyzed {} swings, {} succeeded",
        reports.len(),
        reports.iter().filter(|r| r.is_ok()).count()
    );
    Ok(reports)
}

/// Run [`analyze_stream`] on a background thread.
///
/// The handle always completes with a `Result`; a panic during analysis is
/// reported as a task failure.
pub fn spawn_analysis(stream: SensorStream, config: Config) -> TaskHandle<Vec<Result<SwingReport>>> {
    task::spawn("analyze-stream", move || analyze_stream(&stream, &config))
}
