// src/processing/filters/mod.rs
//! Digital filters for EMG signal processing

pub mod butterworth;
pub mod iir;
pub mod notch;

pub use butterworth::*;
pub use iir::*;
pub use notch::*;

use crate::error::{EmgError, ProcessingStage};
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandType {
    Lowpass,
    Highpass,
    Bandpass,
    Bandstop,
}

impl BandType {
    /// Number of cutoff frequencies the band type needs
    pub fn cutoff_count(&self) -> usize {
        match self {
            BandType::Lowpass | BandType::Highpass => 1,
            BandType::Bandpass | BandType::Bandstop => 2,
        }
    }
}

/// Transfer-function coefficients of an IIR filter
#[derive(Debug, Clone, PartialEq)]
pub struct IirCoefficients {
    pub b: Vec<f64>, // Numerator coefficients
    pub a: Vec<f64>, // Denominator coefficients
}

impl IirCoefficients {
    /// Filter order (degree of the denominator)
    pub fn order(&self) -> usize {
        self.a.len().saturating_sub(1)
    }

    /// Complex response at a normalised frequency (1.0 = Nyquist)
    pub fn response_at(&self, normalized_freq: f64) -> Complex64 {
        let w = PI * normalized_freq;
        let eval = |coeffs: &[f64]| {
            coeffs
                .iter()
                .enumerate()
                .map(|(k, &c)| Complex64::from_polar(c, -w * k as f64))
                .sum::<Complex64>()
        };
        eval(&self.b) / eval(&self.a)
    }

    /// Magnitude response at a normalised frequency (1.0 = Nyquist)
    pub fn gain_at(&self, normalized_freq: f64) -> f64 {
        self.response_at(normalized_freq).norm()
    }
}

/// Filter design and application errors
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Invalid coefficients: {0}")]
    InvalidCoefficients(String),
}

impl From<FilterError> for EmgError {
    fn from(err: FilterError) -> Self {
        EmgError::Processing {
            stage: ProcessingStage::Filtering,
            reason: err.to_string(),
        }
    }
}
