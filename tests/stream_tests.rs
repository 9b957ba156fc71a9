//! End-to-end runs over synthetic headerless logger sessions

use approx::assert_relative_eq;
use nalgebra::Matrix3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use swing_fusion::{
    Config, Error, SensorRecord, SensorStream, SwingSegmenter, analyze_stream, read_logger_csv,
    spawn_analysis,
};

const SESSION_LENGTH: usize = 4000;
const TICKS_PER_SAMPLE: i64 = 82;

fn bump(i: usize, center: usize, width: f64) -> f64 {
    let x = (i as f64 - center as f64) / width;
    (-0.5 * x * x).exp()
}

/// Headerless logger rows with gravity along sensor -Z, small sensor noise, an
/// accelerometer spike at every `accel_bumps` index and a swing-like gyro
/// burst at every `gyro_bumps` index.
fn session_csv(accel_bumps: &[usize], gyro_bumps: &[usize], seed: u64) -> Vec<u8> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    for i in 0..SESSION_LENGTH {
        let spike: f64 = accel_bumps.iter().map(|&c| 7.0 * bump(i, c, 3.0)).sum();
        let swing: f64 = gyro_bumps.iter().map(|&c| bump(i, c, 15.0)).sum();

        let accel_x = spike + rng.random_range(-0.01..0.01);
        let accel_y = rng.random_range(-0.01..0.01);
        let accel_z = -1.0 + rng.random_range(-0.01..0.01);
        let gyro_x = 600.0 * swing + rng.random_range(-0.5..0.5);
        let gyro_y = rng.random_range(-0.5..0.5);
        let gyro_z = 300.0 * swing + rng.random_range(-0.5..0.5);

        writer
            .serialize((
                1_000_000 + i as i64 * TICKS_PER_SAMPLE,
                accel_x,
                accel_y,
                accel_z,
                0.0,
                0.0,
                -1.0,
                gyro_x,
                gyro_y,
                gyro_z,
                spike,
            ))
            .unwrap();
    }
    writer.into_inner().unwrap()
}

fn load_stream(data: &[u8]) -> SensorStream {
    read_logger_csv(data).expect("Failed to read logger data")
}

#[test]
fn test_csv_ingestion() {
    let stream = load_stream(&session_csv(&[], &[], 1));

    assert_eq!(stream.len(), SESSION_LENGTH);
    assert_eq!(stream.time()[0], 0.0);
    assert_relative_eq!(stream.average_dt().unwrap(), 0.010004, epsilon = 1e-9);
    assert_relative_eq!(stream.accel()[10].z, -1.0, epsilon = 0.011);

    let segmenter = SwingSegmenter::new(Default::default()).unwrap();
    assert_eq!(segmenter.window_length(stream.average_dt().unwrap()), 500);
}

/// CSV exports with a header row deserialize straight into `SensorRecord`
#[test]
fn test_headed_export_matches_logger_file() {
    let raw = session_csv(&[], &[], 8);

    let mut headed = b"timestamp,accelX,accelY,accelZ,baselineX,baselineY,baselineZ,gyroX,gyroY,gyroZ,impactLevel\n".to_vec();
    headed.extend_from_slice(&raw);
    let mut reader = csv::Reader::from_reader(headed.as_slice());
    let records: Vec<SensorRecord> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .expect("Failed to parse CSV export");

    assert_eq!(SensorStream::from_records(&records).unwrap(), load_stream(&raw));
}

#[test]
fn test_two_swing_session() {
    let stream = load_stream(&session_csv(&[1205, 2805], &[1200, 2800], 2));
    let reports = analyze_stream(&stream, &Config::default()).unwrap();

    assert_eq!(reports.len(), 2);
    for (expected_impact, report) in [1202, 2802].into_iter().zip(&reports) {
        let report = report.as_ref().unwrap();

        assert!(
            report.impact_index.abs_diff(expected_impact) <= 3,
            "impact at {}",
            report.impact_index
        );
        assert_eq!(report.time.len(), 500);
        assert_eq!(report.rotations.len(), 500);
        assert_eq!(report.swing_angle.len(), 500);
        assert_eq!(report.yaw_speed.len(), 499);
        assert_eq!(report.local_impact_index, 249);
        assert_eq!(
            report.time[report.local_impact_index + 1],
            stream.time()[report.impact_index]
        );

        for r in &report.rotations {
            assert_relative_eq!(r.transpose() * r, Matrix3::identity(), epsilon = 1e-9);
        }
        assert!(
            report
                .swing_angle
                .iter()
                .all(|a| (0.0..=180.0).contains(a))
        );
        assert!(report.yaw_speed.iter().all(|s| s.is_finite() && *s >= 0.0));
        assert!(report.yaw_speed.iter().any(|s| *s > 0.0));
    }
    assert_eq!(reports[0].as_ref().unwrap().window_id, 0);
    assert_eq!(reports[1].as_ref().unwrap().window_id, 1);
}

#[test]
fn test_worker_count_does_not_change_results() {
    let stream = load_stream(&session_csv(&[805, 2005, 3205], &[800, 2000, 3200], 3));

    let single = Config::from_toml_str("workers = 1").unwrap();
    let pooled = Config::from_toml_str("workers = 3").unwrap();

    let single = analyze_stream(&stream, &single).unwrap();
    let pooled = analyze_stream(&stream, &pooled).unwrap();

    assert_eq!(single.len(), 3);
    assert_eq!(single, pooled);
}

#[test]
fn test_quiet_session_has_no_swings() {
    let stream = load_stream(&session_csv(&[], &[], 4));
    let reports = analyze_stream(&stream, &Config::default()).unwrap();
    assert!(reports.is_empty());
}

#[test]
fn test_unmatched_peak() {
    // Equal peak counts, the second gyro burst has no impact anywhere near it
    let stream = load_stream(&session_csv(&[1205, 2005], &[1200, 3600], 5));

    let result = analyze_stream(&stream, &Config::default());
    match result {
        Err(Error::SegmentationError { peak, half_window }) => {
            assert_eq!(half_window, 250);
            assert!(peak.abs_diff(3600) <= 3, "unmatched peak at {peak}");
        }
        other => panic!("expected a segmentation error, got {other:?}"),
    }

    let lenient = Config::from_toml_str("[segmentation]\nskip_unmatched = true").unwrap();
    let reports = analyze_stream(&stream, &lenient).unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].as_ref().unwrap().impact_index.abs_diff(1202) <= 3);
}

#[test]
fn test_invalid_config_rejected_before_work() {
    let stream = load_stream(&session_csv(&[1205], &[1200], 6));
    let mut config = Config::default();
    config.kinematics.shoulder_width = -1.0;
    assert!(matches!(
        analyze_stream(&stream, &config),
        Err(Error::InvalidSettings(_))
    ));
}

#[test]
fn test_background_analysis_matches_foreground() {
    let stream = load_stream(&session_csv(&[1205, 2805], &[1200, 2800], 7));
    let config = Config::default();

    let foreground = analyze_stream(&stream, &config);
    let background = spawn_analysis(stream, config).wait();

    assert_eq!(background, foreground);
    assert_eq!(background.unwrap().len(), 2);
}
