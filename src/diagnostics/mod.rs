// src/diagnostics/mod.rs
//! Classifier diagnostics: confusion matrices, learning curves and validation curves
//!
//! Results are plain serialisable data meant to be plotted by external tools.

pub mod confusion;
pub mod cross_validation;
pub mod estimator;

pub use confusion::{confusion_matrix, ConfusionMatrix};
pub use cross_validation::{
    learning_curve, validation_curve, CurveSummary, LearningCurve, StratifiedKFold, ValidationCurve,
};
pub use estimator::{accuracy, Estimator, KnnClassifier};

use crate::error::{EmgError, EmgResult};
use serde::Serialize;
use std::path::Path;

/// Write any diagnostic result as pretty JSON
pub fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> EmgResult<()> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).map_err(|e| EmgError::io(path, e))
}
