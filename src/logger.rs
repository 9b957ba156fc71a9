//! Reader for raw logger files
//!
//! The logger writes headerless rows of eleven columns:
//!
//! ```text
//! timestamp, accelX, accelY, accelZ, baselineX, baselineY, baselineZ, gyroX, gyroY, gyroZ, impactLevel
//! ```
//!
//! Rows that do not parse, or that carry non-finite values, are logged and
//! dropped. Blank lines are ignored.

use std::io;

use log::{info, warn};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{SensorRecord, SensorStream};

/// One logger row, in column order
#[derive(Debug, Deserialize)]
struct LoggerRow {
    timestamp: i64,
    accel_x: f64,
    accel_y: f64,
    accel_z: f64,
    _baseline_x: f64,
    _baseline_y: f64,
    _baseline_z: f64,
    gyro_x: f64,
    gyro_y: f64,
    gyro_z: f64,
    _impact_level: f64,
}

impl LoggerRow {
    fn is_finite(&self) -> bool {
        [
            self.accel_x,
            self.accel_y,
            self.accel_z,
            self.gyro_x,
            self.gyro_y,
            self.gyro_z,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

impl From<LoggerRow> for SensorRecord {
    fn from(row: LoggerRow) -> Self {
        SensorRecord {
            timestamp: row.timestamp,
            accel_x: row.accel_x,
            accel_y: row.accel_y,
            accel_z: row.accel_z,
            gyro_x: row.gyro_x,
            gyro_y: row.gyro_y,
            gyro_z: row.gyro_z,
        }
    }
}

/// Read a headerless logger file into a stream.
///
/// # Example
/// ```
/// use swing_fusion::read_logger_csv;
///
/// let data = "\
/// 1000,0.0,0.0,-1.0,0.0,0.0,-1.0,0.5,0.0,0.0,0\n\
/// 1082,0.0,0.0,-1.0,0.0,0.0,-1.0,0.5,0.0,0.0,0\n";
/// let stream = read_logger_csv(data.as_bytes()).unwrap();
/// assert_eq!(stream.len(), 2);
/// ```
pub fn read_logger_csv<R: io::Read>(reader: R) -> Result<SensorStream> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut dropped = 0;
    for (index, row) in reader.deserialize::<LoggerRow>().enumerate() {
        match row {
            Ok(row) if row.is_finite() => records.push(SensorRecord::from(row)),
            Ok(_) => {
                warn!("dropping logger row {}: non-finite reading", index + 1);
                dropped += 1;
            }
            Err(err) if err.is_io_error() => {
                return Err(Error::InvalidStream(format!("failed to read logger data: {err}")));
            }
            Err(err) => {
                warn!("dropping logger row {}: {err}", index + 1);
                dropped += 1;
            }
        }
    }

    info!("read {} logger rows, dropped {dropped}", records.len());
    SensorStream::from_records(&records)
}
