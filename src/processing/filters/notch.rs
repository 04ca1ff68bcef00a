// src/processing/filters/notch.rs
//! Second-order IIR notch design for powerline interference removal

use super::{FilterError, IirCoefficients};
use std::f64::consts::PI;

/// Design a notch filter removing `f0` Hz with quality factor `q`
///
/// The -3 dB bandwidth of the notch is `f0 / q`. Gain away from the notch is 1.
pub fn iirnotch(f0: f64, q: f64, sample_rate: f64) -> Result<IirCoefficients, FilterError> {
    if sample_rate <= 0.0 {
        return Err(FilterError::InvalidParameters(format!(
            "Sample rate must be positive, got {}",
            sample_rate
        )));
    }
    let nyquist = sample_rate / 2.0;
    if f0 <= 0.0 || f0 >= nyquist {
        return Err(FilterError::InvalidParameters(format!(
            "Notch frequency {} Hz must lie strictly between 0 and Nyquist ({} Hz)",
            f0, nyquist
        )));
    }
    if q <= 0.0 {
        return Err(FilterError::InvalidParameters(format!(
            "Invalid Q factor: {}",
            q
        )));
    }

    let w0 = f0 / nyquist;
    let bandwidth = PI * w0 / q;
    let w0 = PI * w0;

    // Attenuation at the band edges is -3 dB, so beta reduces to tan(bw / 2)
    let beta = (bandwidth / 2.0).tan();
    let gain = 1.0 / (1.0 + beta);
    let cos_w0 = w0.cos();

    Ok(IirCoefficients {
        b: vec![gain, -2.0 * gain * cos_w0, gain],
        a: vec![1.0, -2.0 * gain * cos_w0, 2.0 * gain - 1.0],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notch_response() {
        let coeffs = iirnotch(50.0, 30.0, 2000.0).unwrap();
        assert!((coeffs.gain_at(0.0) - 1.0).abs() < 1e-12);
        assert!((coeffs.gain_at(1.0) - 1.0).abs() < 1e-12);
        assert!(coeffs.gain_at(50.0 / 1000.0) < 1e-9);
        assert!(coeffs.gain_at(200.0 / 1000.0) > 0.99);
    }

    #[test]
    fn test_notch_bandwidth() {
        let coeffs = iirnotch(100.0, 10.0, 2000.0).unwrap();
        // Band edges sit roughly f0 / (2q) away from the centre
        let edge = coeffs.gain_at(105.0 / 1000.0);
        assert!(edge > 0.6 && edge < 0.8);
    }

    #[test]
    fn test_invalid_notch() {
        assert!(iirnotch(0.0, 30.0, 2000.0).is_err());
        assert!(iirnotch(1000.0, 30.0, 2000.0).is_err());
        assert!(iirnotch(50.0, 0.0, 2000.0).is_err());
        assert!(iirnotch(50.0, 30.0, 0.0).is_err());
    }
}
