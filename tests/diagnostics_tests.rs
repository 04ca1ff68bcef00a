// ================================================================================
// Integration tests for classifier diagnostics on extracted features
// File: tests/diagnostics_tests.rs
// ================================================================================

use nina_emg::diagnostics::{
    confusion_matrix, learning_curve, validation_curve, write_json, Estimator, KnnClassifier,
    LearningCurve, StratifiedKFold,
};
use nina_emg::config::constants::diagnostics::DEFAULT_TRAIN_SIZES;
use nina_emg::processing::features::{FeatureExtractor, FeatureKind};
use ndarray::{Array2, Array3};

/// Two gestures that differ in amplitude; RMS and max separate them cleanly
fn features_and_labels() -> (Array2<f64>, Vec<i32>) {
    let labels: Vec<i32> = (0..24).map(|w| if w % 2 == 0 { 4 } else { 9 }).collect();
    let windows = Array3::from_shape_fn((24, 50, 2), |(w, i, c)| {
        let amplitude = if labels[w] == 4 { 1.0 } else { 5.0 };
        amplitude * ((i as f64 * 0.4 + c as f64 + w as f64 * 0.1).sin())
    });
    let extractor = FeatureExtractor::new(vec![FeatureKind::Rms, FeatureKind::Max], 20).unwrap();
    (extractor.extract(&windows).unwrap().values, labels)
}

#[test]
fn test_knn_on_features() {
    let (x, y) = features_and_labels();
    let mut knn = KnnClassifier::new(3).unwrap();
    knn.fit(x.view(), &y).unwrap();
    let predicted = knn.predict(x.view()).unwrap();

    let cm = confusion_matrix(&y, &predicted).unwrap();
    assert_eq!(cm.labels, vec![4, 9]);
    assert_eq!(cm.accuracy(), 1.0);
    assert_eq!(cm.counts, vec![vec![12, 0], vec![0, 12]]);
}

#[test]
fn test_learning_curve_export() {
    let (x, y) = features_and_labels();
    let cv = StratifiedKFold::new(4).unwrap();
    let curve = learning_curve(|| KnnClassifier::new(1), &x, &y, &cv, &[0.5, 1.0]).unwrap();

    assert_eq!(curve.train_sizes, vec![9, 18]);
    assert!(curve.test_summary().mean.iter().all(|&m| m == 1.0));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning_curve.json");
    write_json(&curve, &path).unwrap();
    let restored: LearningCurve =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(restored.train_sizes, curve.train_sizes);
    assert_eq!(restored.test_scores, curve.test_scores);
}

#[test]
fn test_validation_curve_over_k() {
    let (x, y) = features_and_labels();
    let cv = StratifiedKFold::new(3).unwrap();
    let ks = [1usize, 3, 5];
    let curve = validation_curve(|&k| KnnClassifier::new(k), "k", &ks, &x, &y, &cv).unwrap();

    assert_eq!(curve.param_range, ks.to_vec());
    assert_eq!(curve.train_scores.len(), 3);
    assert!(curve.test_scores.iter().all(|fold_scores| fold_scores.len() == 3));
    assert!(validation_curve(|&k| KnnClassifier::new(k), "k", &[0usize], &x, &y, &cv).is_err());
}

#[test]
fn test_default_train_sizes() {
    let (x, y) = features_and_labels();
    let cv = StratifiedKFold::new(4).unwrap();
    let curve = learning_curve(|| KnnClassifier::new(1), &x, &y, &cv, &DEFAULT_TRAIN_SIZES).unwrap();

    assert_eq!(curve.train_sizes, vec![1, 5, 9, 13, 18]);
    // A single training row only ever predicts its own class
    assert_eq!(curve.test_summary().mean[0], 0.5);
    assert_eq!(curve.fit_times.len(), 5);
}
