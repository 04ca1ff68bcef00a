// src/config/mod.rs
//! Pipeline configuration with TOML loading and validation

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::ConfigLoader;

use crate::error::{EmgErrorBuilder, EmgResult};
use crate::processing::features::FeatureKind;
use crate::processing::filter_bank::{FilterSpec, NotchSpec};
use serde::{Deserialize, Serialize};

/// Complete processing and training configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "defaults::rectify")]
    pub rectify: bool,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    /// Butterworth stage, skipped when absent
    #[serde(default)]
    pub filter: Option<FilterSpec>,
    /// Notch stage, skipped when absent
    #[serde(default)]
    pub notch: Option<NotchSpec>,
    #[serde(default)]
    pub windowing: WindowingConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub pca: PcaConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default = "defaults::sampling_rate_hz")]
    pub sampling_rate_hz: f64,

    #[serde(default = "defaults::channel_count")]
    pub channel_count: usize,
}

/// Standardisation stage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Repetitions the scaler is fitted on; the stage is skipped when absent
    #[serde(default)]
    pub train_repetitions: Option<Vec<i32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowingConfig {
    #[serde(default = "defaults::win_len")]
    pub win_len: usize,

    #[serde(default = "defaults::win_stride")]
    pub win_stride: usize,

    #[serde(default)]
    pub repetitions: Option<Vec<i32>>,

    #[serde(default)]
    pub gestures: Option<Vec<i32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default = "defaults::feature_kinds")]
    pub kinds: Vec<FeatureKind>,

    #[serde(default = "defaults::histogram_bins")]
    pub histogram_bins: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PcaConfig {
    /// Number of principal components kept; no projection when absent
    #[serde(default)]
    pub components: Option<usize>,
}

/// Optimizer and fit loop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "defaults::learning_rate")]
    pub learning_rate: f64,

    #[serde(default = "defaults::beta_1")]
    pub beta_1: f64,

    #[serde(default = "defaults::beta_2")]
    pub beta_2: f64,

    #[serde(default = "defaults::epsilon")]
    pub epsilon: f64,

    #[serde(default = "defaults::decay")]
    pub decay: f64,

    #[serde(default = "defaults::epochs")]
    pub epochs: usize,

    #[serde(default = "defaults::patience")]
    pub patience: usize,

    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    #[serde(default = "defaults::hidden_units")]
    pub hidden_units: usize,

    #[serde(default = "defaults::dropout")]
    pub dropout: f32,

    /// Seed for batch shuffling
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;
    use crate::processing::features::FeatureKind;

    pub fn sampling_rate_hz() -> f64 { signal::DEFAULT_SAMPLING_RATE_HZ }
    pub fn channel_count() -> usize { signal::DEFAULT_CHANNEL_COUNT }
    pub fn rectify() -> bool { false }

    pub fn win_len() -> usize { windowing::DEFAULT_WINDOW_LENGTH }
    pub fn win_stride() -> usize { windowing::DEFAULT_WINDOW_STRIDE }

    pub fn feature_kinds() -> Vec<FeatureKind> {
        vec![
            FeatureKind::Rms,
            FeatureKind::Histogram,
            FeatureKind::Entropy,
            FeatureKind::Kurtosis,
            FeatureKind::ZeroCrossing,
            FeatureKind::Min,
            FeatureKind::Max,
            FeatureKind::Mean,
            FeatureKind::Median,
        ]
    }
    pub fn histogram_bins() -> usize { features::DEFAULT_HISTOGRAM_BINS }

    pub fn learning_rate() -> f64 { training::DEFAULT_LEARNING_RATE }
    pub fn beta_1() -> f64 { training::DEFAULT_BETA_1 }
    pub fn beta_2() -> f64 { training::DEFAULT_BETA_2 }
    pub fn epsilon() -> f64 { training::DEFAULT_EPSILON }
    pub fn decay() -> f64 { training::DEFAULT_DECAY }
    pub fn epochs() -> usize { training::DEFAULT_EPOCHS }
    pub fn patience() -> usize { training::DEFAULT_PATIENCE }
    pub fn batch_size() -> usize { training::DEFAULT_BATCH_SIZE }
    pub fn hidden_units() -> usize { training::DEFAULT_HIDDEN_UNITS }
    pub fn dropout() -> f32 { training::DEFAULT_DROPOUT }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: defaults::sampling_rate_hz(),
            channel_count: defaults::channel_count(),
        }
    }
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self {
            win_len: defaults::win_len(),
            win_stride: defaults::win_stride(),
            repetitions: None,
            gestures: None,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            kinds: defaults::feature_kinds(),
            histogram_bins: defaults::histogram_bins(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: defaults::learning_rate(),
            beta_1: defaults::beta_1(),
            beta_2: defaults::beta_2(),
            epsilon: defaults::epsilon(),
            decay: defaults::decay(),
            epochs: defaults::epochs(),
            patience: defaults::patience(),
            batch_size: defaults::batch_size(),
            hidden_units: defaults::hidden_units(),
            dropout: defaults::dropout(),
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Parse from TOML text and validate
    pub fn from_toml_str(content: &str) -> EmgResult<Self> {
        let config: PipelineConfig = toml::from_str(content).map_err(|e| {
            EmgErrorBuilder::new("config", "from_toml_str").configuration(&e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> EmgResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            EmgErrorBuilder::new("config", "to_toml_string").configuration(&e.to_string())
        })
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> EmgResult<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(EmgErrorBuilder::new("config", "validate").configuration(&errors.join("; ")))
        }
    }

    /// Every consistency problem found, in section order
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let fs = self.signal.sampling_rate_hz;
        if !(fs >= signal::MIN_SAMPLING_RATE_HZ) {
            errors.push(format!("Sampling rate must be at least {} Hz, got {}", signal::MIN_SAMPLING_RATE_HZ, fs));
        }
        if self.signal.channel_count == 0 {
            errors.push("Channel count must be positive".to_string());
        }
        let nyquist = fs / 2.0;

        if let Some(ref reps) = self.normalization.train_repetitions {
            if reps.is_empty() {
                errors.push("Normalization repetitions must not be empty".to_string());
            }
        }

        if let Some(ref filter) = self.filter {
            if filter.order < filters::MIN_FILTER_ORDER || filter.order > filters::MAX_FILTER_ORDER {
                errors.push(format!(
                    "Filter order must be between {} and {}, got {}",
                    filters::MIN_FILTER_ORDER,
                    filters::MAX_FILTER_ORDER,
                    filter.order
                ));
            }
            if filter.cutoff_hz.len() != filter.band.cutoff_count() {
                errors.push(format!(
                    "{:?} filter needs {} cutoff(s), got {}",
                    filter.band,
                    filter.band.cutoff_count(),
                    filter.cutoff_hz.len()
                ));
            }
            for &cutoff in &filter.cutoff_hz {
                if !(cutoff > 0.0 && cutoff < nyquist) {
                    errors.push(format!(
                        "Filter cutoff ({} Hz) must lie between 0 and the Nyquist frequency ({} Hz)",
                        cutoff, nyquist
                    ));
                }
            }
            if let [low, high] = filter.cutoff_hz[..] {
                if low >= high {
                    errors.push(format!("Filter band edges must be increasing, got {} and {}", low, high));
                }
            }
        }

        if let Some(ref notch) = self.notch {
            if !(notch.f0_hz > 0.0 && notch.f0_hz < nyquist) {
                errors.push(format!(
                    "Notch frequency ({} Hz) must lie between 0 and the Nyquist frequency ({} Hz)",
                    notch.f0_hz, nyquist
                ));
            }
            if !(notch.quality > 0.0) {
                errors.push(format!("Notch quality factor must be positive, got {}", notch.quality));
            }
        }

        if self.windowing.win_len == 0 {
            errors.push("Window length must be positive".to_string());
        }
        if self.windowing.win_stride == 0 {
            errors.push("Window stride must be positive".to_string());
        }

        if self.features.kinds.is_empty() {
            errors.push("At least one feature must be selected".to_string());
        }
        if self.features.histogram_bins == 0 {
            errors.push("Histogram bin count must be positive".to_string());
        }

        if self.pca.components == Some(0) {
            errors.push("PCA component count must be positive".to_string());
        }

        errors.extend(self.training.validation_errors());

        errors
    }
}

impl TrainingConfig {
    /// Reject hyperparameters the trainer cannot run with
    pub fn validate(&self) -> EmgResult<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(EmgErrorBuilder::new("config", "validate_training").configuration(&errors.join("; ")))
        }
    }

    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        // Zero is allowed and freezes the weights
        if !(self.learning_rate >= 0.0 && self.learning_rate.is_finite()) {
            errors.push(format!("Learning rate must be a non-negative number, got {}", self.learning_rate));
        }
        if !(0.0..1.0).contains(&self.beta_1) || !(0.0..1.0).contains(&self.beta_2) {
            errors.push("Adam betas must lie in [0, 1)".to_string());
        }
        if !(self.epsilon > 0.0) {
            errors.push("Adam epsilon must be positive".to_string());
        }
        if self.decay < 0.0 {
            errors.push("Learning rate decay must not be negative".to_string());
        }
        if self.epochs == 0 || self.batch_size == 0 || self.hidden_units == 0 {
            errors.push("Epochs, batch size and hidden units must be positive".to_string());
        }
        if !(0.0..1.0).contains(&self.dropout) {
            errors.push(format!("Dropout must lie in [0, 1), got {}", self.dropout));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmgError;
    use crate::processing::filters::BandType;

    #[test]
    fn test_default_config_creation() {
        let config = PipelineConfig::default();
        assert_eq!(config.signal.sampling_rate_hz, signal::DEFAULT_SAMPLING_RATE_HZ);
        assert_eq!(config.signal.channel_count, signal::DEFAULT_CHANNEL_COUNT);
        assert_eq!(config.windowing.win_len, windowing::DEFAULT_WINDOW_LENGTH);
        assert_eq!(config.training.batch_size, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = PipelineConfig::default();
        config.filter = Some(FilterSpec::bandpass(20.0, 450.0, 4));
        config.notch = Some(NotchSpec { f0_hz: 50.0, quality: 30.0 });
        config.pca.components = Some(5);

        let toml_str = config.to_toml_string().unwrap();
        let deserialized = PipelineConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            rectify = true

            [filter]
            band = "lowpass"
            cutoff_hz = [450.0]

            [windowing]
            win_len = 200
            gestures = [1, 2, 3]

            [features]
            kinds = ["rms", "psd"]
            "#,
        )
        .unwrap();

        assert!(config.rectify);
        let filter = config.filter.unwrap();
        assert_eq!(filter.band, BandType::Lowpass);
        assert_eq!(filter.order, filters::DEFAULT_FILTER_ORDER);
        assert_eq!(config.windowing.win_len, 200);
        assert_eq!(config.windowing.win_stride, windowing::DEFAULT_WINDOW_STRIDE);
        assert_eq!(config.windowing.gestures, Some(vec![1, 2, 3]));
        assert_eq!(config.features.kinds, vec![FeatureKind::Rms, FeatureKind::Psd]);
        assert_eq!(config.features.histogram_bins, 20);
        assert!(config.notch.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = PipelineConfig::default();
        config.filter = Some(FilterSpec::lowpass(1200.0, 4));
        config.windowing.win_stride = 0;
        config.notch = Some(NotchSpec { f0_hz: 50.0, quality: 0.0 });

        let errors = config.validation_errors();
        assert_eq!(errors.len(), 3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_band_edges_validated() {
        let mut config = PipelineConfig::default();
        config.filter = Some(FilterSpec::bandstop(300.0, 200.0, 4));
        assert!(config.validate().is_err());

        config.filter = Some(FilterSpec {
            band: BandType::Bandpass,
            cutoff_hz: vec![20.0],
            order: 4,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let result = PipelineConfig::from_toml_str("[features]\nkinds = [\"wavelet\"]");
        assert!(result.is_err());
    }

    #[test]
    fn test_training_config_rejects_zero_batch() {
        let training = TrainingConfig { batch_size: 0, ..TrainingConfig::default() };
        assert_eq!(training.validation_errors().len(), 1);
        assert!(matches!(training.validate(), Err(EmgError::Configuration { .. })));
        assert!(TrainingConfig::default().validate().is_ok());
    }
}
