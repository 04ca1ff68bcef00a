// src/processing/filters/iir.rs
//! IIR (Infinite Impulse Response) filter application

use super::{FilterError, IirCoefficients};

/// Causal IIR filter in direct form II transposed
pub struct IirFilter {
    b: Vec<f64>,
    a: Vec<f64>,
    state: Vec<f64>,
}

impl IirFilter {
    /// Create filter from coefficients, normalising by `a[0]`
    pub fn new(coefficients: &IirCoefficients) -> Result<Self, FilterError> {
        if coefficients.a.is_empty() || coefficients.b.is_empty() {
            return Err(FilterError::InvalidCoefficients("Empty coefficients".to_string()));
        }
        let a0 = coefficients.a[0];
        if a0 == 0.0 || !a0.is_finite() {
            return Err(FilterError::InvalidCoefficients(format!(
                "Leading denominator coefficient must be non-zero, got {}",
                a0
            )));
        }

        // Pad both polynomials to the same length
        let len = coefficients.a.len().max(coefficients.b.len());
        let mut b: Vec<f64> = coefficients.b.iter().map(|&c| c / a0).collect();
        let mut a: Vec<f64> = coefficients.a.iter().map(|&c| c / a0).collect();
        b.resize(len, 0.0);
        a.resize(len, 0.0);

        Ok(Self {
            b,
            a,
            state: vec![0.0; len - 1],
        })
    }

    /// Process a single sample
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let output = self.b[0] * input + self.state.first().copied().unwrap_or(0.0);

        let n = self.state.len();
        for i in 0..n {
            let carry = if i + 1 < n { self.state[i + 1] } else { 0.0 };
            self.state[i] = self.b[i + 1] * input - self.a[i + 1] * output + carry;
        }

        output
    }

    /// Filter a whole signal, continuing from the current state
    pub fn process(&mut self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|&x| self.process_sample(x)).collect()
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.state.fill(0.0);
    }

    /// Get filter order
    pub fn order(&self) -> usize {
        self.state.len()
    }
}

/// Filter a signal from zero initial state
pub fn lfilter(coefficients: &IirCoefficients, input: &[f64]) -> Result<Vec<f64>, FilterError> {
    let mut filter = IirFilter::new(coefficients)?;
    Ok(filter.process(input))
}
