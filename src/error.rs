//! Error type shared by every stage of the swing pipeline

use thiserror::Error;

/// Errors produced by the quaternion algebra, the orientation filter,
/// swing segmentation and the background task runners.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// A quaternion was built from something that is not four components
    #[error("cannot build a quaternion from {0} components")]
    InvalidOperand(usize),

    /// Chart conversion of a quaternion whose scalar part is zero
    #[error("chart conversion undefined for a quaternion with zero scalar part")]
    DivideByZero,

    /// A measurement that the filter cannot use, such as a zero accelerometer vector
    #[error("degenerate measurement: {0}")]
    Degenerate(&'static str),

    /// No correlated accelerometer peak was found near a gyroscope peak (or vice versa)
    #[error("no correlated peak within {half_window} samples of peak at index {peak}")]
    SegmentationError { peak: usize, half_window: usize },

    /// A background job panicked or disappeared before reporting
    #[error("task failed: {0}")]
    TaskFailure(String),

    /// Window contents the filter cannot process
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    /// Stream contents segmentation cannot process
    #[error("invalid sensor stream: {0}")]
    InvalidStream(String),

    /// Settings outside their documented range
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Configuration text that failed to parse
    #[error("failed to parse configuration: {0}")]
    Config(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Crate-wide result alias
pub type Result<T> = core::result::Result<T, Error>;
