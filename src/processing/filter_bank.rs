// src/processing/filter_bank.rs
//! Per-channel filtering of whole recordings

use crate::config::constants::filters::{DEFAULT_FILTER_ORDER, DEFAULT_NOTCH_QUALITY, POWERLINE_FREQ_50HZ};
use crate::dataset::Recording;
use crate::error::EmgResult;
use crate::processing::filters::{butter, iirnotch, BandType, FilterError, IirCoefficients, IirFilter};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Butterworth filter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub band: BandType,
    /// One cutoff for low/high-pass, a `[low, high]` pair for band-pass/band-stop
    pub cutoff_hz: Vec<f64>,
    #[serde(default = "default_order")]
    pub order: usize,
}

fn default_order() -> usize {
    DEFAULT_FILTER_ORDER
}

impl FilterSpec {
    pub fn lowpass(cutoff_hz: f64, order: usize) -> Self {
        Self {
            band: BandType::Lowpass,
            cutoff_hz: vec![cutoff_hz],
            order,
        }
    }

    pub fn highpass(cutoff_hz: f64, order: usize) -> Self {
        Self {
            band: BandType::Highpass,
            cutoff_hz: vec![cutoff_hz],
            order,
        }
    }

    pub fn bandpass(low_hz: f64, high_hz: f64, order: usize) -> Self {
        Self {
            band: BandType::Bandpass,
            cutoff_hz: vec![low_hz, high_hz],
            order,
        }
    }

    pub fn bandstop(low_hz: f64, high_hz: f64, order: usize) -> Self {
        Self {
            band: BandType::Bandstop,
            cutoff_hz: vec![low_hz, high_hz],
            order,
        }
    }

    /// Design the digital filter for `sample_rate`
    pub fn design(&self, sample_rate: f64) -> Result<IirCoefficients, FilterError> {
        butter(self.order, &self.cutoff_hz, self.band, sample_rate)
    }
}

/// Notch filter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotchSpec {
    pub f0_hz: f64,
    #[serde(default = "default_quality")]
    pub quality: f64,
}

fn default_quality() -> f64 {
    DEFAULT_NOTCH_QUALITY
}

impl Default for NotchSpec {
    fn default() -> Self {
        Self {
            f0_hz: POWERLINE_FREQ_50HZ,
            quality: DEFAULT_NOTCH_QUALITY,
        }
    }
}

impl NotchSpec {
    pub fn design(&self, sample_rate: f64) -> Result<IirCoefficients, FilterError> {
        iirnotch(self.f0_hz, self.quality, sample_rate)
    }
}

/// Apply a Butterworth filter to every channel; labels are carried through
pub fn filter_data(recording: &Recording, spec: &FilterSpec, sample_rate: f64) -> EmgResult<Recording> {
    let coefficients = spec.design(sample_rate)?;
    debug!(
        band = ?spec.band,
        cutoff_hz = ?spec.cutoff_hz,
        order = spec.order,
        "Designed Butterworth filter"
    );
    apply_per_channel(recording, &coefficients)
}

/// Remove a narrow band around `f0` Hz from every channel; labels are carried through
pub fn notch_filter(recording: &Recording, f0: f64, q: f64, sample_rate: f64) -> EmgResult<Recording> {
    let coefficients = iirnotch(f0, q, sample_rate)?;
    debug!(f0_hz = f0, quality = q, "Designed notch filter");
    apply_per_channel(recording, &coefficients)
}

/// Run `coefficients` over each channel independently, from zero initial state
pub fn apply_per_channel(recording: &Recording, coefficients: &IirCoefficients) -> EmgResult<Recording> {
    let mut filter = IirFilter::new(coefficients)?;
    let mut output = Array2::<f64>::zeros(recording.emg().raw_dim());

    for (input, mut out) in recording
        .emg()
        .axis_iter(Axis(1))
        .zip(output.axis_iter_mut(Axis(1)))
    {
        filter.reset();
        for (x, y) in input.iter().zip(out.iter_mut()) {
            *y = filter.process_sample(*x);
        }
    }

    recording.with_emg(output)
}
