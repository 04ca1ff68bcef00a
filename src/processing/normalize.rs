// src/processing/normalize.rs
//! Per-channel standardisation fitted on training repetitions

use crate::dataset::Recording;
use crate::error::{EmgError, EmgErrorBuilder, EmgResult, ProcessingStage};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Zero-mean, unit-variance transform per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl StandardScaler {
    /// Fit mean and population standard deviation of every column
    pub fn fit(data: &Array2<f64>) -> EmgResult<Self> {
        if data.nrows() == 0 {
            return Err(EmgError::EmptySelection {
                stage: ProcessingStage::Normalization,
                what: "scaler fit data".to_string(),
            });
        }

        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| {
                EmgErrorBuilder::new("normalize", "fit")
                    .processing(ProcessingStage::Normalization, "mean of empty data")
            })?;
        let std = data.std_axis(Axis(0), 0.0);

        if let Some(channel) = std.iter().position(|&s| s == 0.0 || !s.is_finite()) {
            return Err(EmgErrorBuilder::new("normalize", "fit").processing(
                ProcessingStage::Normalization,
                &format!("channel {} has zero or non-finite variance", channel),
            ));
        }

        Ok(Self {
            mean: mean.to_vec(),
            std: std.to_vec(),
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Apply `(x - mean) / std` column-wise
    pub fn transform(&self, data: &Array2<f64>) -> EmgResult<Array2<f64>> {
        self.check_width(data)?;
        let mean = Array1::from(self.mean.clone());
        let std = Array1::from(self.std.clone());
        Ok((data - &mean) / &std)
    }

    /// Undo [`StandardScaler::transform`]
    pub fn inverse_transform(&self, data: &Array2<f64>) -> EmgResult<Array2<f64>> {
        self.check_width(data)?;
        let mean = Array1::from(self.mean.clone());
        let std = Array1::from(self.std.clone());
        Ok(data * &std + &mean)
    }

    fn check_width(&self, data: &Array2<f64>) -> EmgResult<()> {
        if data.ncols() != self.n_features() {
            return Err(EmgError::ShapeMismatch {
                context: "scaler transform".to_string(),
                expected: vec![data.nrows(), self.n_features()],
                actual: vec![data.nrows(), data.ncols()],
            });
        }
        Ok(())
    }
}

/// Standardise every channel with statistics of the `train_reps` repetitions only
///
/// Returns the scaled recording together with the fitted scaler so the same transform
/// can be reused on other recordings or inverted.
pub fn normalise(recording: &Recording, train_reps: &[i32]) -> EmgResult<(Recording, StandardScaler)> {
    let train = recording.filter_repetitions(train_reps);
    if train.is_empty() {
        return Err(EmgError::EmptySelection {
            stage: ProcessingStage::Normalization,
            what: format!("repetitions {:?}", train_reps),
        });
    }

    let scaler = StandardScaler::fit(train.emg())?;
    debug!(
        fit_rows = train.n_samples(),
        total_rows = recording.n_samples(),
        "Fitted standard scaler"
    );

    let scaled = scaler.transform(recording.emg())?;
    Ok((recording.with_emg(scaled)?, scaler))
}
