//! Time domain features of a single-channel window

/// Root mean square
pub fn rms(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = data.iter().map(|&x| x * x).sum();
    (sum_squares / data.len() as f64).sqrt()
}

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

pub fn min(data: &[f64]) -> f64 {
    data.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn max(data: &[f64]) -> f64 {
    data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Middle value; mean of the two middle values for even lengths
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Fisher (excess) kurtosis without bias correction
///
/// A constant window has no defined kurtosis and yields 0.0.
pub fn kurtosis(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let n = data.len() as f64;
    let mean = mean(data);
    let m2 = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m4 = data.iter().map(|&x| (x - mean).powi(4)).sum::<f64>() / n;
    m4 / (m2 * m2) - 3.0
}

/// Fraction of samples at which the sign of the signal changes
///
/// Sign is -1, 0 or +1, so touching zero counts as a change.
pub fn zero_crossing_rate(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let changes = data
        .windows(2)
        .filter(|pair| sign(pair[0]) != sign(pair[1]))
        .count();
    changes as f64 / data.len() as f64
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms() {
        assert!((rms(&[3.0, -4.0]) - (12.5f64).sqrt()).abs() < 1e-12);
        assert_eq!(rms(&[0.0; 4]), 0.0);
    }

    #[test]
    fn test_order_statistics() {
        let data = [4.0, -1.0, 7.0, 2.0];
        assert_eq!(min(&data), -1.0);
        assert_eq!(max(&data), 7.0);
        assert_eq!(mean(&data), 3.0);
        assert_eq!(median(&data), 3.0);
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
    }

    #[test]
    fn test_kurtosis() {
        // Two-point distribution has excess kurtosis -2
        assert!((kurtosis(&[1.0, -1.0, 1.0, -1.0]) + 2.0).abs() < 1e-12);
        assert!((kurtosis(&[1.0, 2.0, 3.0, 4.0, 5.0]) + 1.3).abs() < 1e-12);
        assert_eq!(kurtosis(&[2.0; 8]), 0.0);
    }

    #[test]
    fn test_zero_crossing_rate() {
        assert_eq!(zero_crossing_rate(&[1.0, -1.0, 1.0, -1.0]), 0.75);
        assert_eq!(zero_crossing_rate(&[1.0, 0.0, 2.0, 3.0]), 0.5);
        assert_eq!(zero_crossing_rate(&[1.0, 2.0]), 0.0);
    }
}
