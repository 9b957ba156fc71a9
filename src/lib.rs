//! Swing Fusion - orientation estimation for swung implements
//!
//! This library turns a synchronized accelerometer/gyroscope recording of a
//! swung implement into per-swing orientation estimates and kinematic curves
//! for motion analysis.
//!
//! # Features
//!
//! - Quaternion complementary filter fusing gyroscope integration with
//!   accelerometer tilt, renormalized through a Gibbs-Rodrigues chart
//! - Accelerometer trust that falls off away from 1 g, so impacts do not
//!   corrupt the tilt estimate
//! - Impact detection from correlated accelerometer and gyroscope peaks
//! - Parallel filtering of independent swing windows with per-window errors
//! - Yaw speed and swing-plane angle curves
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use swing_fusion::{FilterSettings, OrientationFilter, SwingWindow};
//!
//! let filter = OrientationFilter::new(FilterSettings::default()).unwrap();
//!
//! // Three samples at rest: gravity along sensor -Z, no rotation
//! let window = SwingWindow::new(
//!     vec![0.0, 0.01, 0.02],                  // s
//!     vec![Vector3::new(0.0, 0.0, -1.0); 3],  // g
//!     vec![Vector3::zeros(); 3],              // deg/s
//!     1,
//! );
//!
//! let sequence = filter.apply(&window).unwrap();
//! for rotation in sequence.rotation_matrices() {
//!     assert!((rotation.determinant() - 1.0).abs() < 1e-12);
//! }
//! ```
//!
//! Raw logger files are read with [`read_logger_csv`]. Whole recordings go
//! through [`analyze_stream`], which segments the stream, filters every swing
//! in parallel and derives the kinematic curves.

mod axes;
pub mod batch;
mod chart;
pub mod config;
mod error;
pub mod filter;
pub mod kinematics;
mod logger;
pub mod peaks;
pub mod pipeline;
mod quaternion;
pub mod segmentation;
pub mod task;
mod types;

// Re-export all public types and functions
pub use axes::AxesRemap;
pub use batch::BatchRunner;
pub use chart::{from_chart, renormalize, to_chart};
pub use config::Config;
pub use error::{Error, Result};
pub use filter::{OrientationFilter, OrientationSequence};
pub use kinematics::{swing_angle, yaw_speed};
pub use logger::read_logger_csv;
pub use pipeline::{SwingReport, analyze_stream, spawn_analysis};
pub use quaternion::{
    DEG_TO_RAD, QuaternionExt, RAD_TO_DEG, axis_angle, matrix_euler_xyz, quaternion_from_slice,
};
pub use segmentation::SwingSegmenter;
pub use types::*;
