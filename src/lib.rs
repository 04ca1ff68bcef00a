//! NINA-EMG: NinaPro EMG preprocessing, feature extraction and gesture-classifier training
//!
//! The library covers the offline path from a recorded NinaPro session to a trained
//! gesture classifier:
//!
//! - Loading recordings from `.mat` or CSV files
//! - Per-channel standardisation, Butterworth and notch filtering, rectification
//! - Sliding windows restricted to chosen repetitions and gestures
//! - Per-window feature extraction and PCA
//! - One-hot targets, a candle-based trainer with checkpointing and early stopping
//! - Confusion matrices, learning curves and validation curves
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nina_emg::config::PipelineConfig;
//! use nina_emg::dataset::get_data;
//! use nina_emg::processing::SignalPipeline;
//!
//! fn main() -> nina_emg::EmgResult<()> {
//!     let recording = get_data("data/s1", "S1_A1_E1.mat")?;
//!
//!     let mut config = PipelineConfig::default();
//!     config.normalization.train_repetitions = Some(vec![1, 3, 4, 6]);
//!
//!     let mut pipeline = SignalPipeline::new(config)?;
//!     let output = pipeline.process(&recording)?;
//!     output.features.write_csv("features.csv")?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod labels;
#[cfg(feature = "training")]
pub mod model;
pub mod processing;

// Re-export commonly used types for convenience
pub use config::{ConfigLoader, PipelineConfig};
pub use dataset::Recording;
pub use error::{EmgError, EmgErrorBuilder, EmgResult, ProcessingStage};
pub use labels::{get_categorical, LabelEncoding};
pub use processing::{
    feature_extractor, filter_data, normalise, notch_filter, pca, rectify, windowing, FeatureExtractor,
    FeatureKind, FeatureMatrix, SignalPipeline, WindowSet,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    let mut features = vec![
        "MAT and CSV recording loaders".to_string(),
        "Butterworth and notch filtering".to_string(),
        "Window feature extraction".to_string(),
        "PCA".to_string(),
        "Classifier diagnostics".to_string(),
    ];
    if cfg!(feature = "training") {
        features.push("Neural-network training".to_string());
    }

    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "NinaPro EMG preprocessing and gesture-classifier training".to_string(),
        features,
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
