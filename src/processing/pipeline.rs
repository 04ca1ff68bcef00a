// src/processing/pipeline.rs
//! Config-driven composition of the preprocessing stages
//!
//! Stages run in a fixed order, each one optional except windowing and feature extraction:
//! normalisation, Butterworth filter, notch filter, rectification, windowing, feature
//! extraction, PCA.

use crate::config::PipelineConfig;
use crate::dataset::Recording;
use crate::error::{EmgError, EmgResult, ProcessingStage};
use crate::processing::features::{FeatureExtractor, FeatureMatrix};
use crate::processing::filter_bank::apply_per_channel;
use crate::processing::filters::IirCoefficients;
use crate::processing::normalize::{normalise, StandardScaler};
use crate::processing::pca::Pca;
use crate::processing::rectify::rectify;
use crate::processing::windowing::{windowing, WindowSet};
use ndarray::Array2;
use std::time::Instant;
use tracing::info;

/// Batch processing pipeline built from a validated [`PipelineConfig`]
pub struct SignalPipeline {
    config: PipelineConfig,
    filter: Option<IirCoefficients>,
    notch: Option<IirCoefficients>,
    feature_extractor: FeatureExtractor,
    performance_metrics: PerformanceMetrics,
}

/// Wall-clock time spent in each stage of the last run, in milliseconds
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PerformanceMetrics {
    pub recordings_processed: u64,
    pub normalization_ms: f64,
    pub filtering_ms: f64,
    pub windowing_ms: f64,
    pub feature_extraction_ms: f64,
    pub pca_ms: f64,
}

/// Everything a pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The recording after the sample-level stages
    pub recording: Recording,
    pub windows: WindowSet,
    pub features: FeatureMatrix,
    /// Fitted scaler, when normalisation ran
    pub scaler: Option<StandardScaler>,
    /// Fitted projection, when PCA ran
    pub pca: Option<Pca>,
    /// PCA scores, when PCA ran
    pub projected: Option<Array2<f64>>,
}

impl PipelineOutput {
    /// Per-window labels, aligned with the feature rows
    pub fn labels(&self) -> Vec<i32> {
        self.windows.labels.to_vec()
    }

    /// The model input: PCA scores when projected, raw features otherwise
    pub fn model_input(&self) -> &Array2<f64> {
        self.projected.as_ref().unwrap_or(&self.features.values)
    }
}

impl SignalPipeline {
    pub fn new(config: PipelineConfig) -> EmgResult<Self> {
        config.validate()?;
        let fs = config.signal.sampling_rate_hz;

        let filter = config.filter.as_ref().map(|spec| spec.design(fs)).transpose()?;
        let notch = config.notch.as_ref().map(|spec| spec.design(fs)).transpose()?;
        let feature_extractor =
            FeatureExtractor::new(config.features.kinds.clone(), config.features.histogram_bins)?;

        Ok(Self {
            config,
            filter,
            notch,
            feature_extractor,
            performance_metrics: PerformanceMetrics::default(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn feature_extractor(&self) -> &FeatureExtractor {
        &self.feature_extractor
    }

    /// Run every configured stage over `recording`
    pub fn process(&mut self, recording: &Recording) -> EmgResult<PipelineOutput> {
        if recording.n_channels() != self.config.signal.channel_count {
            return Err(EmgError::ShapeMismatch {
                context: "recording channels".to_string(),
                expected: vec![recording.n_samples(), self.config.signal.channel_count],
                actual: vec![recording.n_samples(), recording.n_channels()],
            });
        }
        info!(
            samples = recording.n_samples(),
            channels = recording.n_channels(),
            "Running pipeline"
        );

        // Stage 1: standardisation
        let started = Instant::now();
        let (mut current, scaler) = match self.config.normalization.train_repetitions {
            Some(ref reps) => {
                let (normalised, scaler) = normalise(recording, reps)?;
                info!(train_repetitions = ?reps, "Normalised recording");
                (normalised, Some(scaler))
            }
            None => (recording.clone(), None),
        };
        let normalization_ms = elapsed_ms(started);

        // Stage 2: filtering and rectification
        let started = Instant::now();
        if let Some(ref coefficients) = self.filter {
            current = apply_per_channel(&current, coefficients)?;
            info!(filter = ?self.config.filter, "Applied Butterworth filter");
        }
        if let Some(ref coefficients) = self.notch {
            current = apply_per_channel(&current, coefficients)?;
            info!(notch = ?self.config.notch, "Applied notch filter");
        }
        if self.config.rectify {
            current = rectify(&current)?;
            info!("Rectified recording");
        }
        let filtering_ms = elapsed_ms(started);

        // Stage 3: windowing
        let started = Instant::now();
        let win = &self.config.windowing;
        let windows = windowing(
            &current,
            win.repetitions.as_deref(),
            win.gestures.as_deref(),
            win.win_len,
            win.win_stride,
        )?;
        let windowing_ms = elapsed_ms(started);
        if windows.is_empty() {
            return Err(EmgError::EmptySelection {
                stage: ProcessingStage::Windowing,
                what: format!("windows of {} samples", win.win_len),
            });
        }
        info!(windows = windows.len(), "Windowed recording");

        // Stage 4: features
        let started = Instant::now();
        let features = self.feature_extractor.extract(&windows.windows)?;
        let feature_extraction_ms = elapsed_ms(started);

        // Stage 5: projection
        let started = Instant::now();
        let (pca, projected) = match self.config.pca.components {
            Some(components) => {
                let (pca, scores) = Pca::fit_transform(&features.values, components)?;
                (Some(pca), Some(scores))
            }
            None => (None, None),
        };
        let pca_ms = elapsed_ms(started);

        self.performance_metrics = PerformanceMetrics {
            recordings_processed: self.performance_metrics.recordings_processed + 1,
            normalization_ms,
            filtering_ms,
            windowing_ms,
            feature_extraction_ms,
            pca_ms,
        };
        info!(
            rows = features.n_rows(),
            columns = features.n_cols(),
            "Pipeline finished"
        );

        Ok(PipelineOutput {
            recording: current,
            windows,
            features,
            scaler,
            pca,
            projected,
        })
    }

    pub fn get_performance_metrics(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    pub fn reset_metrics(&mut self) {
        self.performance_metrics = PerformanceMetrics::default();
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
