// src/error.rs
//! Unified error handling for the NinaPro EMG toolkit
//!
//! Every component returns [`EmgResult`]. Failures from the numeric stages carry the
//! [`ProcessingStage`] they came from so a caller running the whole pipeline can tell
//! which step rejected its input.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the toolkit
#[derive(Debug, Error)]
pub enum EmgError {
    /// Reading or writing a file failed
    #[error("[IO] {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset container is malformed or misses a required entry
    #[error("[DATASET] {0}")]
    Dataset(String),

    /// Configuration and setup errors
    #[error("[CONFIG] Configuration error in {component}: {reason}")]
    Configuration { component: String, reason: String },

    /// Signal processing errors
    #[error("[PROCESSING] {stage:?} stage error: {reason}")]
    Processing {
        stage: ProcessingStage,
        reason: String,
    },

    /// Invalid input data errors
    #[error("[DATA] Invalid {data_type}: {reason}{}", format_expectation(.expected, .actual))]
    InvalidData {
        data_type: String,
        reason: String,
        expected: Option<String>,
        actual: Option<String>,
    },

    /// A row filter retained nothing
    #[error("[SELECTION] {stage:?}: no rows match {what}")]
    EmptySelection {
        stage: ProcessingStage,
        what: String,
    },

    /// An array did not have the shape an operation computed for it
    #[error("[SHAPE] {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Neural network construction, training or checkpoint errors
    #[error("[MODEL] {0}")]
    Model(String),

    /// Serialization errors (TOML, JSON, CSV)
    #[error("[SERIALIZATION] {0}")]
    Serialization(String),
}

/// Processing stages for error tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStage {
    Loading,
    Normalization,
    Filtering,
    Rectification,
    Windowing,
    FeatureExtraction,
    DimensionalityReduction,
    Training,
    Evaluation,
    Diagnostics,
}

fn format_expectation(expected: &Option<String>, actual: &Option<String>) -> String {
    match (expected, actual) {
        (Some(exp), Some(act)) => format!(" (expected: {}, got: {})", exp, act),
        _ => String::new(),
    }
}

/// Result type alias for toolkit operations
pub type EmgResult<T> = Result<T, EmgError>;

impl EmgError {
    /// Wrap an IO error with the path it concerned
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EmgError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stage the error originated from, when known
    pub fn stage(&self) -> Option<ProcessingStage> {
        match self {
            EmgError::Processing { stage, .. } | EmgError::EmptySelection { stage, .. } => {
                Some(*stage)
            }
            EmgError::Dataset(_) | EmgError::Io { .. } => Some(ProcessingStage::Loading),
            EmgError::Model(_) => Some(ProcessingStage::Training),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EmgError {
    fn from(err: serde_json::Error) -> Self {
        EmgError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for EmgError {
    fn from(err: csv::Error) -> Self {
        EmgError::Serialization(err.to_string())
    }
}

#[cfg(feature = "training")]
impl From<candle_core::Error> for EmgError {
    fn from(err: candle_core::Error) -> Self {
        EmgError::Model(err.to_string())
    }
}

/// Error builder for convenient error construction
pub struct EmgErrorBuilder {
    component: String,
    operation: String,
}

impl EmgErrorBuilder {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn configuration(self, reason: &str) -> EmgError {
        EmgError::Configuration {
            component: self.component,
            reason: format!("{} ({})", reason, self.operation),
        }
    }

    pub fn processing(self, stage: ProcessingStage, reason: &str) -> EmgError {
        EmgError::Processing {
            stage,
            reason: format!("{}::{}: {}", self.component, self.operation, reason),
        }
    }

    pub fn invalid_data(self, data_type: &str, reason: &str) -> EmgError {
        EmgError::InvalidData {
            data_type: data_type.to_string(),
            reason: format!("{} ({}::{})", reason, self.component, self.operation),
            expected: None,
            actual: None,
        }
    }

    pub fn mismatch(
        self,
        data_type: &str,
        reason: &str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> EmgError {
        EmgError::InvalidData {
            data_type: data_type.to_string(),
            reason: format!("{} ({}::{})", reason, self.component, self.operation),
            expected: Some(expected.to_string()),
            actual: Some(actual.to_string()),
        }
    }
}

/// Convenience trait for error building
pub trait IntoEmgError<T> {
    fn emg_err(self, stage: ProcessingStage, operation: &str) -> EmgResult<T>;
}

impl<T, E> IntoEmgError<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn emg_err(self, stage: ProcessingStage, operation: &str) -> EmgResult<T> {
        self.map_err(|err| EmgError::Processing {
            stage,
            reason: format!("{}: {}", operation, err),
        })
    }
}
