//! Integration tests for the reconstruction pipeline.
//!
//! These tests run the full event log → PNG flow through the public API:
//! - window emission and naming of frames on disk
//! - frames reflect only the events of their window
//! - byte-identical output across repeated runs
//! - fatal handling of malformed and out-of-range input
//!
//! Run with: `cargo test --test reconstruction_integration`

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use evrecon::{ReconstructError, ReconstructionConfig, Reconstructor};

// ============================================================================
// Helper Functions
// ============================================================================

/// Write an event log with the standard header.
fn write_log(dir: &Path, rows: &[(u64, i64, i64, i64)]) -> PathBuf {
    let mut text = String::from("timestamp,x,y,polarity\n");
    for (t, x, y, p) in rows {
        text.push_str(&format!("{},{},{},{}\n", t, x, y, p));
    }
    let path = dir.join("events.csv");
    fs::write(&path, text).unwrap();
    path
}

/// Sorted file names in a directory.
fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn config_16() -> ReconstructionConfig {
    ReconstructionConfig::new().with_dimensions(16, 16)
}

/// A reproducible log of `count` events spread over `span` time units.
fn random_log(seed: u64, count: usize, span: u64) -> Vec<(u64, i64, i64, i64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows: Vec<_> = (0..count)
        .map(|_| {
            (
                rng.random_range(0..span),
                rng.random_range(0..16i64),
                rng.random_range(0..16i64),
                if rng.random_bool(0.5) { 1 } else { 0 },
            )
        })
        .collect();
    rows.sort_by_key(|r| r.0);
    rows
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Three events, the last one in the second window: exactly one frame.
#[test]
fn test_end_to_end_single_frame() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames");
    let log = write_log(dir.path(), &[(0, 0, 0, 1), (0, 10, 10, -1), (1500, 5, 5, 1)]);

    let summary = Reconstructor::new(config_16())
        .unwrap()
        .run_file(&log, &out)
        .unwrap();

    assert_eq!(file_names(&out), vec!["1000.png".to_string()]);
    assert_eq!(summary.events_read, 3);
    assert_eq!(summary.frames.len(), 1);
    assert_eq!(summary.frames[0].event_count, 2);
    assert_eq!(summary.dropped_events, 1);

    // Raw (0, 0) is stored at row 15, raw (10, 10) at row 5.
    let frame = image::open(out.join("1000.png")).unwrap().into_luma8();
    assert_eq!(frame.dimensions(), (16, 16));
    let background = frame.get_pixel(8, 0).0[0];
    assert!(frame.get_pixel(0, 15).0[0] > background);
    assert!(frame.get_pixel(10, 5).0[0] < background);
    // The buffered t=1500 event at raw (5, 5) → row 10 is not in the frame.
    assert!(frame.get_pixel(5, 10).0[0].abs_diff(background) <= 1);
}

/// Events at 500, 1500 and 3500: frames at 1000 and 2000, nothing for the
/// empty window, nothing for the trailing event.
#[test]
fn test_window_gap_emits_single_flush() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames");
    let log = write_log(dir.path(), &[(500, 1, 1, 1), (1500, 2, 2, 1), (3500, 3, 3, 1)]);

    let summary = Reconstructor::new(config_16())
        .unwrap()
        .run_file(&log, &out)
        .unwrap();

    assert_eq!(
        file_names(&out),
        vec!["1000.png".to_string(), "2000.png".to_string()]
    );
    let counts: Vec<usize> = summary.frames.iter().map(|f| f.event_count).collect();
    assert_eq!(counts, vec![1, 1]);
    assert_eq!(summary.dropped_events, 1);
}

/// Identical input and parameters produce byte-identical frames.
#[test]
fn test_repeated_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), &random_log(42, 2_000, 6_000));
    let out_a = dir.path().join("a");
    let out_b = dir.path().join("b");

    let serial = Reconstructor::new(config_16().with_threads(1)).unwrap();
    let parallel = Reconstructor::new(config_16().with_threads(4)).unwrap();
    serial.run_file(&log, &out_a).unwrap();
    parallel.run_file(&log, &out_b).unwrap();

    let names = file_names(&out_a);
    assert!(!names.is_empty());
    assert_eq!(names, file_names(&out_b));
    for name in names {
        let a = fs::read(out_a.join(&name)).unwrap();
        let b = fs::read(out_b.join(&name)).unwrap();
        assert_eq!(a, b, "frame {} differs between runs", name);
    }
}

/// A coordinate outside the sensor aborts the run.
#[test]
fn test_out_of_range_event_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames");
    let log = write_log(dir.path(), &[(0, 1, 1, 1), (10, 16, 3, 1)]);

    let err = Reconstructor::new(config_16())
        .unwrap()
        .run_file(&log, &out)
        .unwrap_err();

    assert!(matches!(
        err,
        ReconstructError::CoordinateOutOfRange { x: 16, y: 3, .. }
    ));
}

/// A malformed row is reported with its line number.
#[test]
fn test_malformed_row_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("events.csv");
    fs::write(&log, "timestamp,x,y,polarity\n0,1,1,1\n5,one,1,1\n").unwrap();

    let err = Reconstructor::new(config_16())
        .unwrap()
        .run_file(&log, &dir.path().join("frames"))
        .unwrap_err();

    match err {
        ReconstructError::InputParse { line, .. } => assert_eq!(line, 3),
        other => panic!("unexpected error: {:?}", other),
    }
}

/// Every exported frame spans the full gray range mapping of the bounds.
#[test]
fn test_frames_have_sensor_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames");
    let log = write_log(dir.path(), &random_log(7, 500, 4_000));

    let config = ReconstructionConfig::new().with_dimensions(16, 16);
    let summary = Reconstructor::new(config).unwrap().run_file(&log, &out).unwrap();

    for frame in &summary.frames {
        let image = image::open(&frame.path).unwrap().into_luma8();
        assert_eq!(image.dimensions(), (16, 16));
        assert_eq!(
            frame.path.file_name().unwrap().to_string_lossy(),
            format!("{}.png", frame.window_end)
        );
    }
}
