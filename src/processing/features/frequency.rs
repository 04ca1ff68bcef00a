//! Frequency domain features using rustfft

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Forward FFT planned once for a fixed window length
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f64>>,
    len: usize,
}

impl SpectrumAnalyzer {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            fft: planner.plan_fft_forward(len),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Full complex spectrum of `data`, unnormalised
    ///
    /// Shorter input is zero-padded and longer input truncated to the planned length.
    pub fn spectrum(&self, data: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = data
            .iter()
            .take(self.len)
            .map(|&x| Complex64::new(x, 0.0))
            .collect();
        buffer.resize(self.len, Complex64::new(0.0, 0.0));
        self.fft.process(&mut buffer);
        buffer
    }

    /// Spectrum as interleaved `[re0, im0, re1, im1, ..]`
    pub fn fft_interleaved(&self, data: &[f64]) -> Vec<f64> {
        self.spectrum(data)
            .into_iter()
            .flat_map(|c| [c.re, c.im])
            .collect()
    }

    /// Power spectrum `|X[k]|^2`
    pub fn power_spectrum(&self, data: &[f64]) -> Vec<f64> {
        self.spectrum(data).into_iter().map(|c| c.norm_sqr()).collect()
    }
}
