//! Amplitude distribution features: histogram counts and histogram entropy

/// Equal-width binning over the range of a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinRange {
    pub low: f64,
    pub high: f64,
    pub bins: usize,
}

impl BinRange {
    /// Range spanning `[min, max]` of `data`, widened by 0.5 on each side when flat
    pub fn of(data: &[f64], bins: usize) -> Self {
        let low = data.iter().copied().fold(f64::INFINITY, f64::min);
        let high = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !low.is_finite() || !high.is_finite() {
            return Self { low: 0.0, high: 1.0, bins };
        }
        if low == high {
            Self {
                low: low - 0.5,
                high: high + 0.5,
                bins,
            }
        } else {
            Self { low, high, bins }
        }
    }

    pub fn width(&self) -> f64 {
        (self.high - self.low) / self.bins as f64
    }

    /// Bin holding `x`; the last bin is closed on the right
    pub fn bin_of(&self, x: f64) -> Option<usize> {
        if self.bins == 0 || x < self.low || x > self.high || x.is_nan() {
            return None;
        }
        let idx = ((x - self.low) / (self.high - self.low) * self.bins as f64).floor() as usize;
        Some(idx.min(self.bins - 1))
    }
}

/// Sample counts in `bins` equal-width bins
pub fn histogram(data: &[f64], bins: usize) -> Vec<f64> {
    let range = BinRange::of(data, bins);
    let mut counts = vec![0.0; bins];
    for &x in data {
        if let Some(idx) = range.bin_of(x) {
            counts[idx] += 1.0;
        }
    }
    counts
}

/// Shannon entropy (nats) of the histogram density evaluated at every sample
///
/// A sample sitting on the right-most edge lies outside the density's support and
/// contributes zero.
pub fn histogram_entropy(data: &[f64], bins: usize) -> f64 {
    if data.is_empty() || bins == 0 {
        return 0.0;
    }
    let range = BinRange::of(data, bins);
    let counts = histogram(data, bins);
    let norm = data.len() as f64 * range.width();

    let pk: Vec<f64> = data
        .iter()
        .map(|&x| {
            if x >= range.high {
                0.0
            } else {
                range.bin_of(x).map_or(0.0, |idx| counts[idx] / norm)
            }
        })
        .collect();

    let total: f64 = pk.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    pk.iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| {
            let p = p / total;
            -p * p.ln()
        })
        .sum()
}
