// src/dataset/mod.rs
//! Recording data model and dataset loaders

pub mod loader;

pub use loader::*;

use crate::error::{EmgErrorBuilder, EmgResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// One subject recording: per-sample channel readings with gesture and repetition labels
///
/// Rows are samples in acquisition order. `stimulus` and `repetition` are aligned 1:1
/// with the rows of `emg`.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    emg: Array2<f64>,
    stimulus: Array1<i32>,
    repetition: Array1<i32>,
}

impl Recording {
    /// Build a recording, checking that labels line up with samples
    pub fn new(
        emg: Array2<f64>,
        stimulus: Array1<i32>,
        repetition: Array1<i32>,
    ) -> EmgResult<Self> {
        let samples = emg.nrows();
        if emg.ncols() == 0 {
            return Err(EmgErrorBuilder::new("recording", "new")
                .invalid_data("recording", "at least one channel is required"));
        }
        if stimulus.len() != samples {
            return Err(EmgErrorBuilder::new("recording", "new").mismatch(
                "recording",
                "stimulus length differs from sample count",
                samples,
                stimulus.len(),
            ));
        }
        if repetition.len() != samples {
            return Err(EmgErrorBuilder::new("recording", "new").mismatch(
                "recording",
                "repetition length differs from sample count",
                samples,
                repetition.len(),
            ));
        }

        Ok(Self {
            emg,
            stimulus,
            repetition,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.emg.nrows()
    }

    pub fn n_channels(&self) -> usize {
        self.emg.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_samples() == 0
    }

    /// Channel readings, samples × channels
    pub fn emg(&self) -> &Array2<f64> {
        &self.emg
    }

    pub fn stimulus(&self) -> &Array1<i32> {
        &self.stimulus
    }

    pub fn repetition(&self) -> &Array1<i32> {
        &self.repetition
    }

    /// Readings of one channel over time
    pub fn channel(&self, index: usize) -> ArrayView1<'_, f64> {
        self.emg.column(index)
    }

    /// Same labels, new channel readings
    ///
    /// Used by the processing stages, which only ever touch the channel columns.
    pub fn with_emg(&self, emg: Array2<f64>) -> EmgResult<Self> {
        Self::new(emg, self.stimulus.clone(), self.repetition.clone())
    }

    /// Keep only the rows whose index satisfies `keep`, in their original order
    pub fn select_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(usize) -> bool,
    {
        let rows: Vec<usize> = (0..self.n_samples()).filter(|&i| keep(i)).collect();
        Self {
            emg: self.emg.select(Axis(0), &rows),
            stimulus: self.stimulus.select(Axis(0), &rows),
            repetition: self.repetition.select(Axis(0), &rows),
        }
    }

    /// Rows recorded during one of `repetitions`
    pub fn filter_repetitions(&self, repetitions: &[i32]) -> Self {
        self.select_rows(|i| repetitions.contains(&self.repetition[i]))
    }

    /// Rows labelled with one of `gestures`
    pub fn filter_gestures(&self, gestures: &[i32]) -> Self {
        self.select_rows(|i| gestures.contains(&self.stimulus[i]))
    }

    /// Distinct gesture labels, ascending
    pub fn gestures(&self) -> Vec<i32> {
        sorted_unique(self.stimulus.iter().copied())
    }

    /// Distinct repetition indices, ascending
    pub fn repetitions(&self) -> Vec<i32> {
        sorted_unique(self.repetition.iter().copied())
    }
}

pub(crate) fn sorted_unique(values: impl Iterator<Item = i32>) -> Vec<i32> {
    let mut unique: Vec<i32> = values.collect();
    unique.sort_unstable();
    unique.dedup();
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    fn sample_recording() -> Recording {
        let emg = Array::from_shape_fn((6, 2), |(i, j)| (i * 10 + j) as f64);
        Recording::new(emg, array![0, 1, 1, 2, 2, 0], array![1, 1, 2, 2, 3, 3]).unwrap()
    }

    #[test]
    fn test_recording_shape() {
        let recording = sample_recording();
        assert_eq!(recording.n_samples(), 6);
        assert_eq!(recording.n_channels(), 2);
        assert_eq!(recording.channel(1)[2], 21.0);
    }

    #[test]
    fn test_misaligned_labels_rejected() {
        let emg = Array2::<f64>::zeros((4, 2));
        assert!(Recording::new(emg.clone(), array![0, 0, 0], array![1, 1, 1, 1]).is_err());
        assert!(Recording::new(emg, array![0, 0, 0, 0], array![1]).is_err());
        assert!(Recording::new(Array2::zeros((4, 0)), array![0, 0, 0, 0], array![1, 1, 1, 1]).is_err());
    }

    #[test]
    fn test_filtering_keeps_order() {
        let recording = sample_recording();
        let filtered = recording.filter_repetitions(&[3, 1]);
        assert_eq!(filtered.n_samples(), 4);
        assert_eq!(filtered.repetition().to_vec(), vec![1, 1, 3, 3]);
        assert_eq!(filtered.emg()[[2, 0]], 40.0);

        let gestures = recording.filter_gestures(&[2]);
        assert_eq!(gestures.stimulus().to_vec(), vec![2, 2]);
    }

    #[test]
    fn test_unique_labels() {
        let recording = sample_recording();
        assert_eq!(recording.gestures(), vec![0, 1, 2]);
        assert_eq!(recording.repetitions(), vec![1, 2, 3]);
    }
}
