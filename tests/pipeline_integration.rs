// ================================================================================
// End-to-end tests: recording file + TOML configuration -> feature matrix
// File: tests/pipeline_integration.rs
// ================================================================================

use nina_emg::config::{ConfigLoader, PipelineConfig};
use nina_emg::dataset::{load_csv, write_csv, Recording};
use nina_emg::labels::get_categorical;
use nina_emg::processing::{FeatureKind, SignalPipeline};
use ndarray::{Array1, Array2};
use std::fs;

fn synthetic_recording() -> Recording {
    // Gesture 1 is a 40 Hz burst, gesture 2 a 200 Hz burst, rest is quiet
    let emg = Array2::from_shape_fn((1200, 4), |(i, c)| {
        let t = i as f64 / 2000.0;
        let gain = 1.0 + c as f64 * 0.1;
        match i / 200 % 3 {
            1 => gain * (2.0 * std::f64::consts::PI * 40.0 * t).sin(),
            2 => gain * 3.0 * (2.0 * std::f64::consts::PI * 200.0 * t).sin(),
            _ => 0.01 * ((i * 7 + c) % 5) as f64,
        }
    });
    let stimulus = Array1::from_shape_fn(1200, |i| (i / 200 % 3) as i32);
    let repetition = Array1::from_shape_fn(1200, |i| (i / 600) as i32 + 1);
    Recording::new(emg, stimulus, repetition).unwrap()
}

const CONFIG: &str = r#"
rectify = true

[signal]
sampling_rate_hz = 2000.0
channel_count = 4

[normalization]
train_repetitions = [1]

[filter]
band = "bandpass"
cutoff_hz = [10.0, 450.0]

[notch]
f0_hz = 50.0

[windowing]
win_len = 100
win_stride = 50
gestures = [1, 2]

[features]
kinds = ["rms", "mean", "zero_crossing", "histogram"]
histogram_bins = 5
"#;

#[test]
fn test_csv_recording_to_features() {
    let dir = tempfile::tempdir().unwrap();
    let recording_path = dir.path().join("s1.csv");
    let config_path = dir.path().join("pipeline.toml");
    let output_path = dir.path().join("features.csv");

    let recording = synthetic_recording();
    write_csv(&recording, &recording_path).unwrap();
    fs::write(&config_path, CONFIG).unwrap();

    let loaded = load_csv(&recording_path).unwrap();
    assert_eq!(loaded.n_samples(), 1200);
    assert_eq!(loaded.stimulus(), recording.stimulus());

    let config = ConfigLoader::load_file(&config_path).unwrap();
    assert_eq!(config.filter.as_ref().unwrap().order, 4);
    assert_eq!(config.notch.as_ref().unwrap().quality, 30.0);

    let mut pipeline = SignalPipeline::new(config).unwrap();
    let output = pipeline.process(&loaded).unwrap();

    // 800 rows of gestures 1 and 2 -> (800 - 100) / 50 + 1 windows
    assert_eq!(output.windows.len(), 15);
    assert_eq!(output.features.n_cols(), (1 + 1 + 1 + 5) * 4);
    assert!(output.labels().iter().all(|&l| l == 1 || l == 2));

    output.features.write_csv(&output_path).unwrap();
    let text = fs::read_to_string(&output_path).unwrap();
    assert_eq!(text.lines().count(), 16);
    assert!(text.starts_with("rms_ch0,rms_ch1"));

    let (one_hot, encoding) = get_categorical(&output.labels()).unwrap();
    assert_eq!(encoding.classes(), &[1, 2]);
    assert_eq!(one_hot.dim(), (15, 2));
}

#[test]
fn test_rms_separates_gestures() {
    let mut config = PipelineConfig::default();
    config.signal.channel_count = 4;
    config.rectify = true;
    config.windowing.win_len = 200;
    config.windowing.win_stride = 200;
    config.features.kinds = vec![FeatureKind::Rms];

    let mut pipeline = SignalPipeline::new(config).unwrap();
    let output = pipeline.process(&synthetic_recording()).unwrap();

    let rms = output.features.column("rms_ch0").unwrap();
    for (w, &label) in output.labels().iter().enumerate() {
        match label {
            0 => assert!(rms[w] < 0.1),
            1 => assert!(rms[w] > 0.5 && rms[w] < 1.0),
            _ => assert!(rms[w] > 2.0),
        }
    }
}

#[test]
fn test_invalid_config_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[filter]\nband = \"lowpass\"\ncutoff_hz = [1500.0]\n").unwrap();
    assert!(ConfigLoader::load_file(&path).is_err());
    assert!(ConfigLoader::validate_file(&path).is_err());
}

#[test]
fn test_config_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exported.toml");
    let config = PipelineConfig::from_toml_str(CONFIG).unwrap();

    ConfigLoader::export(&config, &path).unwrap();
    let restored = ConfigLoader::load_file(&path).unwrap();
    assert_eq!(restored, config);
}
