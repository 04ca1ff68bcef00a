// src/diagnostics/confusion.rs
//! Confusion matrix over gesture labels

use crate::dataset::sorted_unique;
use crate::error::{EmgError, EmgErrorBuilder, EmgResult, ProcessingStage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Counts of true label (rows) against predicted label (columns)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Union of true and predicted labels, ascending
    pub labels: Vec<i32>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f64 / total as f64,
        }
    }

    /// Fraction of each true label predicted correctly; 0 for labels never seen as truth
    pub fn recall(&self) -> Vec<f64> {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let support: usize = row.iter().sum();
                if support == 0 {
                    0.0
                } else {
                    row[i] as f64 / support as f64
                }
            })
            .collect()
    }

    /// Fraction of each predicted label that was correct; 0 for labels never predicted
    pub fn precision(&self) -> Vec<f64> {
        (0..self.labels.len())
            .map(|j| {
                let predicted: usize = self.counts.iter().map(|row| row[j]).sum();
                if predicted == 0 {
                    0.0
                } else {
                    self.counts[j][j] as f64 / predicted as f64
                }
            })
            .collect()
    }

    /// Rows scaled to sum to one
    pub fn normalized(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let support: usize = row.iter().sum();
                row.iter()
                    .map(|&c| if support == 0 { 0.0 } else { c as f64 / support as f64 })
                    .collect()
            })
            .collect()
    }

    /// CSV with a `true\predicted` corner cell and labels on both axes
    pub fn write_csv(&self, path: impl AsRef<Path>) -> EmgResult<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec!["true\\predicted".to_string()];
        header.extend(self.labels.iter().map(|l| l.to_string()));
        writer.write_record(&header)?;

        for (label, row) in self.labels.iter().zip(&self.counts) {
            let mut record = vec![label.to_string()];
            record.extend(row.iter().map(|c| c.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush().map_err(|e| EmgError::io(path, e))
    }
}

/// Tabulate `y_true` against `y_pred`
pub fn confusion_matrix(y_true: &[i32], y_pred: &[i32]) -> EmgResult<ConfusionMatrix> {
    if y_true.len() != y_pred.len() {
        return Err(EmgErrorBuilder::new("diagnostics", "confusion_matrix").mismatch(
            "predictions",
            "prediction count differs from label count",
            y_true.len(),
            y_pred.len(),
        ));
    }
    if y_true.is_empty() {
        return Err(EmgError::EmptySelection {
            stage: ProcessingStage::Diagnostics,
            what: "labels for confusion matrix".to_string(),
        });
    }

    let labels = sorted_unique(y_true.iter().chain(y_pred).copied());
    let mut counts = vec![vec![0usize; labels.len()]; labels.len()];
    for (t, p) in y_true.iter().zip(y_pred) {
        // Both are in the union by construction
        if let (Ok(i), Ok(j)) = (labels.binary_search(t), labels.binary_search(p)) {
            counts[i][j] += 1;
        }
    }

    Ok(ConfusionMatrix { labels, counts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix() {
        let cm = confusion_matrix(&[0, 0, 3, 3, 3, 7], &[0, 3, 3, 3, 0, 7]).unwrap();
        assert_eq!(cm.labels, vec![0, 3, 7]);
        assert_eq!(cm.counts, vec![vec![1, 1, 0], vec![1, 2, 0], vec![0, 0, 1]]);
        assert_eq!(cm.total(), 6);
        assert!((cm.accuracy() - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(cm.recall()[0], 0.5);
        assert!((cm.recall()[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.precision()[1] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(cm.normalized()[2], vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_predicted_only_label() {
        let cm = confusion_matrix(&[1, 1], &[1, 2]).unwrap();
        assert_eq!(cm.labels, vec![1, 2]);
        assert_eq!(cm.recall(), vec![0.5, 0.0]);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(confusion_matrix(&[1, 2], &[1]).is_err());
        assert!(confusion_matrix(&[], &[]).is_err());
    }

    #[test]
    fn test_exports() {
        let dir = tempfile::tempdir().unwrap();
        let cm = confusion_matrix(&[1, 2, 2], &[1, 2, 1]).unwrap();

        let csv_path = dir.path().join("cm.csv");
        cm.write_csv(&csv_path).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["true\\predicted,1,2", "1,1,0", "2,1,1"]);

        let json_path = dir.path().join("cm.json");
        crate::diagnostics::write_json(&cm, &json_path).unwrap();
        let restored: ConfusionMatrix =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(restored, cm);
    }
}
