// src/config/constants.rs
//! Default values and limits used across the toolkit

/// Signal acquisition constants (NinaPro DB2-style recordings)
pub mod signal {
    pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 2000.0;
    pub const DEFAULT_CHANNEL_COUNT: usize = 12;
    pub const MIN_SAMPLING_RATE_HZ: f64 = 1.0;
}

/// Dataset container entry names
pub mod dataset {
    pub const EMG_ENTRY: &str = "emg";
    pub const STIMULUS_ENTRY: &str = "restimulus";
    pub const REPETITION_ENTRY: &str = "repetition";
    pub const STIMULUS_COLUMN: &str = "stimulus";
    pub const REPETITION_COLUMN: &str = "repetition";
}

/// Signal processing filter constants
pub mod filters {
    pub const DEFAULT_FILTER_ORDER: usize = 4;
    pub const MIN_FILTER_ORDER: usize = 1;
    pub const MAX_FILTER_ORDER: usize = 8;
    pub const POWERLINE_FREQ_50HZ: f64 = 50.0;
    pub const DEFAULT_NOTCH_QUALITY: f64 = 30.0;
}

/// Windowing constants
pub mod windowing {
    pub const DEFAULT_WINDOW_LENGTH: usize = 400;
    pub const DEFAULT_WINDOW_STRIDE: usize = 20;
}

/// Feature extraction constants
pub mod features {
    pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
}

/// Training constants
pub mod training {
    pub const DEFAULT_LEARNING_RATE: f64 = 1e-4;
    pub const DEFAULT_BETA_1: f64 = 0.9;
    pub const DEFAULT_BETA_2: f64 = 0.999;
    pub const DEFAULT_EPSILON: f64 = 1e-8;
    pub const DEFAULT_DECAY: f64 = 0.0;
    pub const DEFAULT_EPOCHS: usize = 300;
    pub const DEFAULT_PATIENCE: usize = 30;
    pub const DEFAULT_BATCH_SIZE: usize = 32;
    pub const DEFAULT_HIDDEN_UNITS: usize = 128;
    pub const DEFAULT_DROPOUT: f32 = 0.2;
    pub const CHECKPOINT_SUFFIX: &str = "_best_model.safetensors";
}

/// Diagnostics constants
pub mod diagnostics {
    pub const DEFAULT_CV_FOLDS: usize = 5;
    pub const DEFAULT_TRAIN_SIZES: [f64; 5] = [0.1, 0.325, 0.55, 0.775, 1.0];
}

/// Configuration file discovery
pub mod paths {
    pub const DEFAULT_CONFIG_FILE: &str = "nina_emg.toml";
    pub const LOCAL_CONFIG_FILE: &str = "nina_emg.local.toml";
    pub const ENV_PREFIX: &str = "NINA_EMG_";
    /// Separates nested keys in environment overrides, e.g. `NINA_EMG_WINDOWING__WIN_LEN`
    pub const ENV_SEPARATOR: &str = "__";
}
