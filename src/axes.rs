//! Sensor axes remapping into the filter's working frame
//!
//! The logger mounts its IMU so that sensor X points along the shaft. The
//! filter works in a frame where the shaft is the negative Z axis:
//!
//! | working | sensor |
//! |---------|--------|
//! | X       | +Y     |
//! | Y       | +Z     |
//! | Z       | -X     |
//!
//! The same remap must be applied to the reference direction, every
//! accelerometer sample and every gyroscope sample, which is why it lives in
//! [`crate::FilterSettings`] rather than at each call site.
//!
//! # Example
//! ```
//! use nalgebra::Vector3;
//! use swing_fusion::AxesRemap;
//!
//! let working = AxesRemap::WORKING_FRAME.apply(&Vector3::new(1.0, 2.0, 3.0));
//! assert_eq!(working, Vector3::new(2.0, 3.0, -1.0));
//! ```

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Signed permutation of sensor axes.
///
/// Working axis `i` takes sensor axis `source[i]` multiplied by `sign[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxesRemap {
    source: [usize; 3],
    sign: [f64; 3],
}

impl AxesRemap {
    /// No remapping
    pub const IDENTITY: Self = Self {
        source: [0, 1, 2],
        sign: [1.0, 1.0, 1.0],
    };

    /// Sensor `(x, y, z)` to working `(y, z, -x)`
    pub const WORKING_FRAME: Self = Self {
        source: [1, 2, 0],
        sign: [1.0, 1.0, -1.0],
    };

    /// Build a remap, checking that `source` is a permutation and every sign is ±1.
    pub fn new(source: [usize; 3], sign: [f64; 3]) -> Result<Self> {
        let remap = Self { source, sign };
        remap.validate()?;
        Ok(remap)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let mut seen = [false; 3];
        for &axis in &self.source {
            if axis > 2 || seen[axis] {
                return Err(Error::InvalidSettings(format!(
                    "axes remap source {:?} is not a permutation of 0..3",
                    self.source
                )));
            }
            seen[axis] = true;
        }
        if self.sign.iter().any(|s| s.abs() != 1.0) {
            return Err(Error::InvalidSettings(format!(
                "axes remap signs {:?} must be +1 or -1",
                self.sign
            )));
        }
        Ok(())
    }

    /// Remap a sensor-frame vector into the working frame
    #[inline]
    pub fn apply(&self, sensor: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            self.sign[0] * sensor[self.source[0]],
            self.sign[1] * sensor[self.source[1]],
            self.sign[2] * sensor[self.source[2]],
        )
    }

    /// The remap that undoes this one
    pub fn inverse(&self) -> Self {
        let mut source = [0; 3];
        let mut sign = [1.0; 3];
        for (working, &sensor) in self.source.iter().enumerate() {
            source[sensor] = working;
            sign[sensor] = self.sign[working];
        }
        Self { source, sign }
    }
}

impl Default for AxesRemap {
    fn default() -> Self {
        Self::WORKING_FRAME
    }
}
