// src/diagnostics/estimator.rs
//! Estimator interface used by the cross-validation curves

use crate::error::{EmgError, EmgErrorBuilder, EmgResult, ProcessingStage};
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::collections::BTreeMap;

/// A classifier that can be refitted on feature rows
pub trait Estimator {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[i32]) -> EmgResult<()>;

    fn predict(&self, x: ArrayView2<'_, f64>) -> EmgResult<Vec<i32>>;

    /// Accuracy of the predictions on `x`
    fn score(&self, x: ArrayView2<'_, f64>, y: &[i32]) -> EmgResult<f64> {
        let predicted = self.predict(x)?;
        accuracy(y, &predicted)
    }
}

/// Fraction of positions where `y_pred` equals `y_true`
pub fn accuracy(y_true: &[i32], y_pred: &[i32]) -> EmgResult<f64> {
    if y_true.len() != y_pred.len() {
        return Err(EmgErrorBuilder::new("diagnostics", "accuracy").mismatch(
            "predictions",
            "prediction count differs from label count",
            y_true.len(),
            y_pred.len(),
        ));
    }
    if y_true.is_empty() {
        return Err(EmgError::EmptySelection {
            stage: ProcessingStage::Evaluation,
            what: "labels for accuracy".to_string(),
        });
    }
    let hits = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(hits as f64 / y_true.len() as f64)
}

/// k-nearest-neighbour majority vote with Euclidean distance
///
/// Vote ties go to the smallest label.
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: usize,
    features: Array2<f64>,
    labels: Vec<i32>,
}

impl KnnClassifier {
    pub fn new(k: usize) -> EmgResult<Self> {
        if k == 0 {
            return Err(EmgErrorBuilder::new("knn", "new").configuration("k must be positive"));
        }
        Ok(Self {
            k,
            features: Array2::zeros((0, 0)),
            labels: Vec::new(),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn classify(&self, query: ArrayView1<'_, f64>) -> i32 {
        let mut distances: Vec<(f64, i32)> = self
            .features
            .rows()
            .into_iter()
            .zip(&self.labels)
            .map(|(row, &label)| (euclidean_distance(row, query), label))
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut votes: BTreeMap<i32, usize> = BTreeMap::new();
        for &(_, label) in distances.iter().take(self.k) {
            *votes.entry(label).or_insert(0) += 1;
        }

        let mut best = (i32::MIN, 0usize);
        for (&label, &count) in &votes {
            if count > best.1 {
                best = (label, count);
            }
        }
        best.0
    }
}

impl Estimator for KnnClassifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[i32]) -> EmgResult<()> {
        if x.nrows() != y.len() {
            return Err(EmgErrorBuilder::new("knn", "fit").mismatch(
                "labels",
                "label count differs from row count",
                x.nrows(),
                y.len(),
            ));
        }
        if y.is_empty() {
            return Err(EmgError::EmptySelection {
                stage: ProcessingStage::Training,
                what: "k-NN training rows".to_string(),
            });
        }
        self.features = x.to_owned();
        self.labels = y.to_vec();
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> EmgResult<Vec<i32>> {
        if self.labels.is_empty() {
            return Err(EmgErrorBuilder::new("knn", "predict")
                .processing(ProcessingStage::Evaluation, "classifier has not been fitted"));
        }
        if x.ncols() != self.features.ncols() {
            return Err(EmgError::ShapeMismatch {
                context: "k-NN query".to_string(),
                expected: vec![x.nrows(), self.features.ncols()],
                actual: vec![x.nrows(), x.ncols()],
            });
        }
        Ok(x.rows().into_iter().map(|row| self.classify(row)).collect())
    }
}

fn euclidean_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
