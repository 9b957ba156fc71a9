//! Pipeline configuration
//!
//! Every section has defaults, so a TOML file only needs the keys it wants
//! to change:
//!
//! ```
//! use swing_fusion::Config;
//!
//! let config = Config::from_toml_str(r#"
//!     workers = 4
//!
//!     [filter]
//!     accel_ratio = 0.3
//!     reference = [0.0, 0.0, -1.0]
//!
//!     [kinematics]
//!     shoulder_width = 0.42
//! "#).unwrap();
//!
//! assert_eq!(config.workers, Some(4));
//! assert_eq!(config.filter.accel_ratio, 0.3);
//! assert_eq!(config.segmentation.window_seconds, 5.0);
//! ```

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{FilterSettings, KinematicSettings, SegmentationSettings};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter worker threads, `None` for every available core
    pub workers: Option<usize>,
    pub filter: FilterSettings,
    pub segmentation: SegmentationSettings,
    pub kinematics: KinematicSettings,
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        info!("loaded configuration: {config:?}");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.segmentation.validate()?;
        self.kinematics.validate()
    }
}
