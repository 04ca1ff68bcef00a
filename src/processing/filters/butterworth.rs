// src/processing/filters/butterworth.rs
//! Digital Butterworth filter design
//!
//! The design runs in zeros/poles/gain form: analog prototype, frequency
//! transformation to the requested band, bilinear transform, then expansion to
//! transfer-function coefficients. Cutoffs are given in Hz and normalised by the
//! Nyquist frequency before design.

use super::{BandType, FilterError, IirCoefficients};
use crate::config::constants::filters::{MAX_FILTER_ORDER, MIN_FILTER_ORDER};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Zeros, poles and gain of a transfer function
#[derive(Debug, Clone)]
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

// Sampling rate of the normalised design domain (Nyquist = 1)
const DESIGN_FS: f64 = 2.0;

/// Design a digital Butterworth filter
///
/// `cutoff_hz` holds one frequency for low/high-pass and a `(low, high)` pair for
/// band-pass/band-stop.
pub fn butter(
    order: usize,
    cutoff_hz: &[f64],
    band: BandType,
    sample_rate: f64,
) -> Result<IirCoefficients, FilterError> {
    if !(MIN_FILTER_ORDER..=MAX_FILTER_ORDER).contains(&order) {
        return Err(FilterError::InvalidParameters(format!(
            "Order must be {}-{}, got {}",
            MIN_FILTER_ORDER, MAX_FILTER_ORDER, order
        )));
    }
    if sample_rate <= 0.0 {
        return Err(FilterError::InvalidParameters(format!(
            "Sample rate must be positive, got {}",
            sample_rate
        )));
    }
    if cutoff_hz.len() != band.cutoff_count() {
        return Err(FilterError::InvalidParameters(format!(
            "{:?} filter needs {} cutoff frequencies, got {}",
            band,
            band.cutoff_count(),
            cutoff_hz.len()
        )));
    }

    let nyquist = sample_rate / 2.0;
    let normalized: Vec<f64> = cutoff_hz.iter().map(|&f| f / nyquist).collect();
    for (&wn, &f) in normalized.iter().zip(cutoff_hz) {
        if !(wn > 0.0 && wn < 1.0) {
            return Err(FilterError::InvalidParameters(format!(
                "Cutoff {} Hz must lie strictly between 0 and Nyquist ({} Hz)",
                f, nyquist
            )));
        }
    }
    if normalized.len() == 2 && normalized[0] >= normalized[1] {
        return Err(FilterError::InvalidParameters(
            "Low cutoff must be less than high cutoff".to_string(),
        ));
    }

    // Pre-warp frequencies for the bilinear transform
    let warped: Vec<f64> = normalized
        .iter()
        .map(|&wn| 2.0 * DESIGN_FS * (PI * wn / DESIGN_FS).tan())
        .collect();

    let prototype = analog_prototype(order);
    let analog = match band {
        BandType::Lowpass => lowpass_to_lowpass(prototype, warped[0]),
        BandType::Highpass => lowpass_to_highpass(prototype, warped[0]),
        BandType::Bandpass => {
            let (wo, bw) = center_and_width(warped[0], warped[1]);
            lowpass_to_bandpass(prototype, wo, bw)
        }
        BandType::Bandstop => {
            let (wo, bw) = center_and_width(warped[0], warped[1]);
            lowpass_to_bandstop(prototype, wo, bw)
        }
    };

    let digital = bilinear(analog, DESIGN_FS);
    zpk_to_tf(&digital)
}

fn center_and_width(low: f64, high: f64) -> (f64, f64) {
    ((low * high).sqrt(), high - low)
}

/// Normalised analog Butterworth prototype: poles on the left half of the unit circle
fn analog_prototype(order: usize) -> Zpk {
    let n = order as i64;
    let poles = (0..n)
        .map(|i| {
            let m = (-n + 1 + 2 * i) as f64;
            -Complex64::from_polar(1.0, PI * m / (2.0 * order as f64))
        })
        .collect();
    Zpk {
        zeros: Vec::new(),
        poles,
        gain: 1.0,
    }
}

fn relative_degree(zpk: &Zpk) -> usize {
    zpk.poles.len() - zpk.zeros.len()
}

/// Product of `-x` over all roots
fn neg_product(roots: &[Complex64]) -> Complex64 {
    roots.iter().fold(Complex64::new(1.0, 0.0), |acc, &r| acc * -r)
}

fn lowpass_to_lowpass(zpk: Zpk, wo: f64) -> Zpk {
    let degree = relative_degree(&zpk);
    Zpk {
        zeros: zpk.zeros.iter().map(|&z| z * wo).collect(),
        poles: zpk.poles.iter().map(|&p| p * wo).collect(),
        gain: zpk.gain * wo.powi(degree as i32),
    }
}

fn lowpass_to_highpass(zpk: Zpk, wo: f64) -> Zpk {
    let degree = relative_degree(&zpk);
    let gain = zpk.gain * (neg_product(&zpk.zeros) / neg_product(&zpk.poles)).re;

    let mut zeros: Vec<Complex64> = zpk.zeros.iter().map(|&z| wo / z).collect();
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: zpk.poles.iter().map(|&p| wo / p).collect(),
        gain,
    }
}

fn lowpass_to_bandpass(zpk: Zpk, wo: f64, bw: f64) -> Zpk {
    let degree = relative_degree(&zpk);
    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        let scaled: Vec<Complex64> = roots.iter().map(|&r| r * bw / 2.0).collect();
        let upper = scaled.iter().map(|&r| r + (r * r - wo * wo).sqrt());
        let lower = scaled.iter().map(|&r| r - (r * r - wo * wo).sqrt());
        upper.chain(lower).collect()
    };

    let mut zeros = split(&zpk.zeros);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: split(&zpk.poles),
        gain: zpk.gain * bw.powi(degree as i32),
    }
}

fn lowpass_to_bandstop(zpk: Zpk, wo: f64, bw: f64) -> Zpk {
    let degree = relative_degree(&zpk);
    let gain = zpk.gain * (neg_product(&zpk.zeros) / neg_product(&zpk.poles)).re;
    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        let inverted: Vec<Complex64> = roots.iter().map(|&r| (bw / 2.0) / r).collect();
        let upper = inverted.iter().map(|&r| r + (r * r - wo * wo).sqrt());
        let lower = inverted.iter().map(|&r| r - (r * r - wo * wo).sqrt());
        upper.chain(lower).collect()
    };

    let mut zeros = split(&zpk.zeros);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, wo)).take(degree));
    zeros.extend(std::iter::repeat(Complex64::new(0.0, -wo)).take(degree));

    Zpk {
        zeros,
        poles: split(&zpk.poles),
        gain,
    }
}

/// Bilinear transform from the s-plane to the z-plane
fn bilinear(zpk: Zpk, fs: f64) -> Zpk {
    let degree = relative_degree(&zpk);
    let fs2 = Complex64::new(2.0 * fs, 0.0);

    let mut zeros: Vec<Complex64> = zpk.zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));
    let poles = zpk.poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();

    let num = zpk.zeros.iter().fold(Complex64::new(1.0, 0.0), |acc, &z| acc * (fs2 - z));
    let den = zpk.poles.iter().fold(Complex64::new(1.0, 0.0), |acc, &p| acc * (fs2 - p));

    Zpk {
        zeros,
        poles,
        gain: zpk.gain * (num / den).re,
    }
}

/// Expand a set of roots into monic polynomial coefficients (highest power first)
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}

fn zpk_to_tf(zpk: &Zpk) -> Result<IirCoefficients, FilterError> {
    let b: Vec<f64> = poly(&zpk.zeros).iter().map(|c| c.re * zpk.gain).collect();
    let a: Vec<f64> = poly(&zpk.poles).iter().map(|c| c.re).collect();

    if b.iter().chain(a.iter()).any(|c| !c.is_finite()) {
        return Err(FilterError::InvalidCoefficients(
            "Filter design produced non-finite coefficients".to_string(),
        ));
    }

    Ok(IirCoefficients { b, a })
}
