// src/processing/pca.rs
//! Principal component projection of feature matrices

use crate::error::{EmgError, EmgErrorBuilder, EmgResult, ProcessingStage};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fitted principal component model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pca {
    mean: Vec<f64>,
    /// components × features, rows sorted by descending variance
    components: Array2<f64>,
    explained_variance: Vec<f64>,
    explained_variance_ratio: Vec<f64>,
}

impl Pca {
    /// Fit `comp` components on `data` (rows are observations)
    ///
    /// Each component is oriented so that its largest-magnitude loading is positive.
    pub fn fit(data: &Array2<f64>, comp: usize) -> EmgResult<Self> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(EmgErrorBuilder::new("pca", "fit").invalid_data(
                "pca input",
                &format!("need at least one row and one column, got {}x{}", rows, cols),
            ));
        }
        if comp == 0 || comp > rows.min(cols) {
            return Err(EmgErrorBuilder::new("pca", "fit").configuration(&format!(
                "component count must be between 1 and {}, got {}",
                rows.min(cols),
                comp
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(EmgErrorBuilder::new("pca", "fit")
                .invalid_data("pca input", "data contains non-finite values"));
        }

        let mean = data.mean_axis(Axis(0)).ok_or_else(|| {
            EmgErrorBuilder::new("pca", "fit")
                .processing(ProcessingStage::DimensionalityReduction, "mean of empty data")
        })?;
        let centered = data - &mean;
        // A single row has zero variance; keep the divisor positive
        let covariance = centered.t().dot(&centered) / rows.saturating_sub(1).max(1) as f64;

        let eigen = SymmetricEigen::new(DMatrix::from_fn(cols, cols, |i, j| covariance[[i, j]]));

        let mut order: Vec<usize> = (0..cols).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let mut components = Array2::<f64>::zeros((comp, cols));
        let mut explained_variance = Vec::with_capacity(comp);
        for (row, &idx) in order.iter().take(comp).enumerate() {
            let vector = eigen.eigenvectors.column(idx);
            let pivot = vector
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0);
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
            for (j, value) in vector.iter().enumerate() {
                components[[row, j]] = sign * value;
            }
            explained_variance.push(eigen.eigenvalues[idx].max(0.0));
        }

        let total: f64 = eigen.eigenvalues.iter().map(|v| v.max(0.0)).sum();
        let explained_variance_ratio = explained_variance
            .iter()
            .map(|v| if total > 0.0 { v / total } else { 0.0 })
            .collect::<Vec<_>>();

        info!(
            components = comp,
            features = cols,
            explained = explained_variance_ratio.iter().sum::<f64>(),
            "Fitted PCA"
        );

        Ok(Self {
            mean: mean.to_vec(),
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    /// Project rows of `data` onto the components
    pub fn transform(&self, data: &Array2<f64>) -> EmgResult<Array2<f64>> {
        if data.ncols() != self.mean.len() {
            return Err(EmgError::ShapeMismatch {
                context: "pca transform".to_string(),
                expected: vec![data.nrows(), self.mean.len()],
                actual: vec![data.nrows(), data.ncols()],
            });
        }
        let centered = data - &Array1::from(self.mean.clone());
        Ok(centered.dot(&self.components.t()))
    }

    pub fn fit_transform(data: &Array2<f64>, comp: usize) -> EmgResult<(Self, Array2<f64>)> {
        let model = Self::fit(data, comp)?;
        let projected = model.transform(data)?;
        Ok((model, projected))
    }
}

/// Fit on `data` and return its projection onto `comp` components
pub fn pca(data: &Array2<f64>, comp: usize) -> EmgResult<Array2<f64>> {
    Pca::fit_transform(data, comp).map(|(_, projected)| projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn line_data() -> Array2<f64> {
        // Points along (1, 2) with a small orthogonal wobble
        Array2::from_shape_fn((20, 2), |(i, j)| {
            let t = i as f64 - 10.0;
            let wobble = if i % 2 == 0 { 0.01 } else { -0.01 };
            if j == 0 {
                t - 2.0 * wobble
            } else {
                2.0 * t + wobble
            }
        })
    }

    #[test]
    fn test_principal_direction() {
        let model = Pca::fit(&line_data(), 2).unwrap();
        let first = model.components().row(0);
        let norm = 5.0f64.sqrt();
        assert!((first[0] - 1.0 / norm).abs() < 1e-4);
        assert!((first[1] - 2.0 / norm).abs() < 1e-4);
        assert!(model.explained_variance_ratio()[0] > 0.999);
        assert!(model.explained_variance()[0] >= model.explained_variance()[1]);
    }

    #[test]
    fn test_output_shape() {
        let data = Array2::from_shape_fn((15, 6), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        let projected = pca(&data, 3).unwrap();
        assert_eq!(projected.dim(), (15, 3));

        // Projections are centred
        for col in projected.columns() {
            assert!(col.sum().abs() < 1e-9);
        }
    }

    #[test]
    fn test_invalid_component_count() {
        let data = line_data();
        assert!(pca(&data, 0).is_err());
        assert!(pca(&data, 3).is_err());
        assert!(pca(&array![[1.0, 2.0]], 2).is_err());
        assert!(pca(&Array2::zeros((0, 2)), 1).is_err());
    }

    #[test]
    fn test_single_row() {
        let row = array![[1.0, 2.0, 3.0]];
        let model = Pca::fit(&row, 1).unwrap();
        assert_eq!(model.explained_variance_ratio(), &[0.0]);

        let projected = pca(&row, 1).unwrap();
        assert_eq!(projected.dim(), (1, 1));
        assert_eq!(projected[[0, 0]], 0.0);
    }

    #[test]
    fn test_transform_width_checked() {
        let model = Pca::fit(&line_data(), 1).unwrap();
        assert!(model.transform(&array![[1.0, 2.0, 3.0]]).is_err());
    }
}
