//! EMG window feature extraction
//!
//! Every feature is a function of one channel of one window. The extractor applies an
//! ordered list of features to every (window, channel) pair and lays the results out as:
//! - feature order (outermost)
//! - channel
//! - feature component (innermost, for multi-valued features such as histograms)

pub mod distribution;
pub mod frequency;
pub mod time_domain;

use crate::config::constants::features::DEFAULT_HISTOGRAM_BINS;
use crate::error::{EmgError, EmgErrorBuilder, EmgResult, ProcessingStage};
use ndarray::{s, Array2, Array3, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

pub use distribution::{histogram, histogram_entropy};
pub use frequency::SpectrumAnalyzer;
pub use time_domain::{kurtosis, max, mean, median, min, rms, zero_crossing_rate};

/// Per-channel window features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Rms,
    Histogram,
    Entropy,
    Kurtosis,
    ZeroCrossing,
    Min,
    Max,
    Mean,
    Median,
    /// Complex spectrum, real and imaginary parts interleaved
    Fft,
    /// Power spectrum
    Psd,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 11] = [
        FeatureKind::Rms,
        FeatureKind::Histogram,
        FeatureKind::Entropy,
        FeatureKind::Kurtosis,
        FeatureKind::ZeroCrossing,
        FeatureKind::Min,
        FeatureKind::Max,
        FeatureKind::Mean,
        FeatureKind::Median,
        FeatureKind::Fft,
        FeatureKind::Psd,
    ];

    /// Number of values produced per channel for windows of `win_len` samples
    pub fn arity(&self, win_len: usize, bins: usize) -> usize {
        match self {
            FeatureKind::Histogram => bins,
            FeatureKind::Fft => 2 * win_len,
            FeatureKind::Psd => win_len,
            _ => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::Rms => "rms",
            FeatureKind::Histogram => "histogram",
            FeatureKind::Entropy => "entropy",
            FeatureKind::Kurtosis => "kurtosis",
            FeatureKind::ZeroCrossing => "zero_crossing",
            FeatureKind::Min => "min",
            FeatureKind::Max => "max",
            FeatureKind::Mean => "mean",
            FeatureKind::Median => "median",
            FeatureKind::Fft => "fft",
            FeatureKind::Psd => "psd",
        }
    }

    /// Evaluate on one channel of one window
    pub fn compute(&self, signal: &[f64], bins: usize, spectrum: &SpectrumAnalyzer) -> Vec<f64> {
        match self {
            FeatureKind::Rms => vec![rms(signal)],
            FeatureKind::Histogram => histogram(signal, bins),
            FeatureKind::Entropy => vec![histogram_entropy(signal, bins)],
            FeatureKind::Kurtosis => vec![kurtosis(signal)],
            FeatureKind::ZeroCrossing => vec![zero_crossing_rate(signal)],
            FeatureKind::Min => vec![min(signal)],
            FeatureKind::Max => vec![max(signal)],
            FeatureKind::Mean => vec![mean(signal)],
            FeatureKind::Median => vec![median(signal)],
            FeatureKind::Fft => spectrum.fft_interleaved(signal),
            FeatureKind::Psd => spectrum.power_spectrum(signal),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named feature table, one row per window
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub values: Array2<f64>,
    pub columns: Vec<String>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| self.values.column(idx))
    }

    /// Write as CSV with the column names as header
    pub fn write_csv(&self, path: impl AsRef<Path>) -> EmgResult<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in self.values.rows() {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush().map_err(|e| EmgError::io(path, e))?;
        debug!(path = %path.display(), rows = self.n_rows(), cols = self.n_cols(), "Wrote feature matrix");
        Ok(())
    }
}

/// Applies an ordered feature list to windowed data
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureExtractor {
    kinds: Vec<FeatureKind>,
    histogram_bins: usize,
}

impl FeatureExtractor {
    pub fn new(kinds: Vec<FeatureKind>, histogram_bins: usize) -> EmgResult<Self> {
        if kinds.is_empty() {
            return Err(EmgErrorBuilder::new("features", "new")
                .configuration("at least one feature must be selected"));
        }
        if histogram_bins == 0 {
            return Err(EmgErrorBuilder::new("features", "new")
                .configuration("histogram bin count must be positive"));
        }
        Ok(Self {
            kinds,
            histogram_bins,
        })
    }

    pub fn kinds(&self) -> &[FeatureKind] {
        &self.kinds
    }

    pub fn histogram_bins(&self) -> usize {
        self.histogram_bins
    }

    /// Total output width for windows of `win_len` samples over `channels` channels
    pub fn n_columns(&self, win_len: usize, channels: usize) -> usize {
        self.kinds
            .iter()
            .map(|k| k.arity(win_len, self.histogram_bins) * channels)
            .sum()
    }

    /// Column names `<feature>_ch<c>` or `<feature>_ch<c>_<k>` for multi-valued features
    pub fn column_names(&self, win_len: usize, channels: usize) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_columns(win_len, channels));
        for kind in &self.kinds {
            let arity = kind.arity(win_len, self.histogram_bins);
            for c in 0..channels {
                if arity == 1 {
                    names.push(format!("{}_ch{}", kind, c));
                } else {
                    names.extend((0..arity).map(|k| format!("{}_ch{}_{}", kind, c, k)));
                }
            }
        }
        names
    }

    /// Extract features from windows shaped windows × win_len × channels
    pub fn extract(&self, windows: &Array3<f64>) -> EmgResult<FeatureMatrix> {
        let (count, win_len, channels) = windows.dim();
        if win_len == 0 || channels == 0 {
            return Err(EmgErrorBuilder::new("features", "extract").invalid_data(
                "windows",
                &format!("windows must have samples and channels, got shape {:?}", windows.shape()),
            ));
        }

        let columns = self.column_names(win_len, channels);
        let mut values = Array2::<f64>::zeros((count, columns.len()));
        let spectrum = SpectrumAnalyzer::new(win_len);
        let mut signal = vec![0.0; win_len];
        let mut offset = 0;

        for kind in &self.kinds {
            let arity = kind.arity(win_len, self.histogram_bins);
            info!(feature = %kind, arity, windows = count, "Extracting feature");

            for (w, window) in windows.axis_iter(Axis(0)).enumerate() {
                for c in 0..channels {
                    for (dst, src) in signal.iter_mut().zip(window.slice(s![.., c]).iter()) {
                        *dst = *src;
                    }
                    let output = kind.compute(&signal, self.histogram_bins, &spectrum);
                    if output.len() != arity {
                        return Err(EmgError::ShapeMismatch {
                            context: format!("feature '{}'", kind),
                            expected: vec![arity],
                            actual: vec![output.len()],
                        });
                    }
                    let start = offset + c * arity;
                    values
                        .slice_mut(s![w, start..start + arity])
                        .iter_mut()
                        .zip(output)
                        .for_each(|(dst, v)| *dst = v);
                }
            }

            offset += arity * channels;
            debug!(feature = %kind, "Done extracting feature");
        }

        if offset != columns.len() {
            return Err(EmgErrorBuilder::new("features", "extract").processing(
                ProcessingStage::FeatureExtraction,
                &format!("filled {} of {} columns", offset, columns.len()),
            ));
        }

        Ok(FeatureMatrix { values, columns })
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            kinds: vec![
                FeatureKind::Rms,
                FeatureKind::Histogram,
                FeatureKind::Entropy,
                FeatureKind::Kurtosis,
                FeatureKind::ZeroCrossing,
                FeatureKind::Min,
                FeatureKind::Max,
                FeatureKind::Mean,
                FeatureKind::Median,
            ],
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

/// Extract `kinds` from `windows` with the default histogram bin count
pub fn feature_extractor(kinds: &[FeatureKind], windows: &Array3<f64>) -> EmgResult<FeatureMatrix> {
    FeatureExtractor::new(kinds.to_vec(), DEFAULT_HISTOGRAM_BINS)?.extract(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows() -> Array3<f64> {
        Array3::from_shape_fn((3, 8, 2), |(w, i, c)| {
            ((w + 1) as f64) * if c == 0 { i as f64 } else { -(i as f64) }
        })
    }

    #[test]
    fn test_arity() {
        assert_eq!(FeatureKind::Rms.arity(400, 20), 1);
        assert_eq!(FeatureKind::Histogram.arity(400, 20), 20);
        assert_eq!(FeatureKind::Fft.arity(400, 20), 800);
        assert_eq!(FeatureKind::Psd.arity(400, 20), 400);
    }

    #[test]
    fn test_column_layout() {
        let extractor =
            FeatureExtractor::new(vec![FeatureKind::Max, FeatureKind::Histogram], 3).unwrap();
        let names = extractor.column_names(8, 2);
        assert_eq!(
            names,
            vec![
                "max_ch0", "max_ch1", "histogram_ch0_0", "histogram_ch0_1", "histogram_ch0_2",
                "histogram_ch1_0", "histogram_ch1_1", "histogram_ch1_2",
            ]
        );
    }

    #[test]
    fn test_extract_values() {
        let matrix = feature_extractor(&[FeatureKind::Max, FeatureKind::Min], &windows()).unwrap();
        assert_eq!(matrix.values.dim(), (3, 4));
        assert_eq!(matrix.column("max_ch0").unwrap().to_vec(), vec![7.0, 14.0, 21.0]);
        assert_eq!(matrix.column("min_ch1").unwrap().to_vec(), vec![-7.0, -14.0, -21.0]);
    }

    #[test]
    fn test_all_features_width() {
        let extractor = FeatureExtractor::new(FeatureKind::ALL.to_vec(), 20).unwrap();
        let matrix = extractor.extract(&windows()).unwrap();
        let per_channel = 1 + 20 + 1 + 1 + 1 + 1 + 1 + 1 + 1 + 16 + 8;
        assert_eq!(matrix.n_cols(), per_channel * 2);
        assert_eq!(matrix.columns.len(), matrix.n_cols());
        assert!(matrix.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_invalid_extractor() {
        assert!(FeatureExtractor::new(vec![], 20).is_err());
        assert!(FeatureExtractor::new(vec![FeatureKind::Rms], 0).is_err());
        let empty = Array3::<f64>::zeros((2, 0, 3));
        assert!(FeatureExtractor::default().extract(&empty).is_err());
    }

    #[test]
    fn test_no_windows() {
        let matrix = FeatureExtractor::default().extract(&Array3::zeros((0, 10, 2))).unwrap();
        assert_eq!(matrix.n_rows(), 0);
        assert_eq!(matrix.n_cols(), 28 * 2);
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.csv");
        let matrix = feature_extractor(&[FeatureKind::Rms], &windows()).unwrap();
        matrix.write_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("rms_ch0,rms_ch1"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_serde_names() {
        let kinds: Vec<FeatureKind> = serde_json::from_str(r#"["rms", "zero_crossing", "psd"]"#).unwrap();
        assert_eq!(kinds, vec![FeatureKind::Rms, FeatureKind::ZeroCrossing, FeatureKind::Psd]);
    }
}
