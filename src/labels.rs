// src/labels.rs
//! Gesture label encoding for classifiers

use crate::dataset::sorted_unique;
use crate::error::{EmgErrorBuilder, EmgResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Mapping between gesture labels and contiguous class indices
///
/// Class `i` is the `i`-th smallest label seen at fit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoding {
    classes: Vec<i32>,
}

impl LabelEncoding {
    pub fn fit(labels: &[i32]) -> EmgResult<Self> {
        if labels.is_empty() {
            return Err(EmgErrorBuilder::new("labels", "fit")
                .invalid_data("labels", "cannot encode an empty label set"));
        }
        Ok(Self {
            classes: sorted_unique(labels.iter().copied()),
        })
    }

    pub fn from_classes(classes: Vec<i32>) -> EmgResult<Self> {
        Self::fit(&classes)
    }

    pub fn classes(&self) -> &[i32] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn index_of(&self, label: i32) -> Option<usize> {
        self.classes.binary_search(&label).ok()
    }

    /// Class indices of `labels`; unknown labels are an error
    pub fn encode(&self, labels: &[i32]) -> EmgResult<Vec<usize>> {
        labels
            .iter()
            .map(|&label| {
                self.index_of(label).ok_or_else(|| {
                    EmgErrorBuilder::new("labels", "encode").mismatch(
                        "label",
                        "label was not seen when the encoding was fitted",
                        format!("{:?}", self.classes),
                        label,
                    )
                })
            })
            .collect()
    }

    /// Labels of class `indices`
    pub fn decode(&self, indices: &[usize]) -> EmgResult<Vec<i32>> {
        indices
            .iter()
            .map(|&idx| {
                self.classes.get(idx).copied().ok_or_else(|| {
                    EmgErrorBuilder::new("labels", "decode").mismatch(
                        "class index",
                        "class index out of range",
                        format!("< {}", self.n_classes()),
                        idx,
                    )
                })
            })
            .collect()
    }

    /// One-hot rows, labels × classes
    pub fn one_hot(&self, labels: &[i32]) -> EmgResult<Array2<f32>> {
        let indices = self.encode(labels)?;
        let mut encoded = Array2::<f32>::zeros((labels.len(), self.n_classes()));
        for (row, idx) in indices.into_iter().enumerate() {
            encoded[[row, idx]] = 1.0;
        }
        Ok(encoded)
    }
}

/// One-hot encode `labels` over their sorted distinct values
pub fn get_categorical(labels: &[i32]) -> EmgResult<(Array2<f32>, LabelEncoding)> {
    let encoding = LabelEncoding::fit(labels)?;
    let one_hot = encoding.one_hot(labels)?;
    Ok((one_hot, encoding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_get_categorical() {
        let (one_hot, encoding) = get_categorical(&[3, 0, 17, 3]).unwrap();
        assert_eq!(encoding.classes(), &[0, 3, 17]);
        assert_eq!(
            one_hot,
            array![[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]]
        );
    }

    #[test]
    fn test_encode_decode() {
        let encoding = LabelEncoding::fit(&[5, 2, 9]).unwrap();
        let indices = encoding.encode(&[9, 2]).unwrap();
        assert_eq!(indices, vec![2, 0]);
        assert_eq!(encoding.decode(&indices).unwrap(), vec![9, 2]);
        assert!(encoding.encode(&[4]).is_err());
        assert!(encoding.decode(&[3]).is_err());
    }

    #[test]
    fn test_empty_labels() {
        assert!(get_categorical(&[]).is_err());
    }
}
