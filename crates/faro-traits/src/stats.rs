//! Statistical helpers shared by the data, model and evaluation crates.
//!
//! All functions ignore non-finite inputs and return `NaN` when nothing
//! usable is left, so callers can test `is_finite()` instead of matching on
//! errors.

/// Minimum threshold for standard deviation to avoid division by zero.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|x| x.is_finite()).collect()
}

/// Arithmetic mean of the finite values.
///
/// # Examples
///
/// ```
/// use faro_traits::stats::mean;
///
/// assert_eq!(mean(&[1.0, 2.0, f64::NAN, 3.0]), 2.0);
/// assert!(mean(&[]).is_nan());
/// ```
pub fn mean(values: &[f64]) -> f64 {
    let valid = finite(values);
    if valid.is_empty() {
        return f64::NAN;
    }
    valid.iter().sum::<f64>() / valid.len() as f64
}

/// Sample standard deviation (N-1 denominator) of the finite values.
///
/// Returns `NaN` with fewer than two finite values.
pub fn sample_std(values: &[f64]) -> f64 {
    let valid = finite(values);
    let n = valid.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = valid.iter().sum::<f64>() / n as f64;
    let variance = valid.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Quantile with linear interpolation between closest ranks.
///
/// For sorted values `v[0..n]` the quantile `q` sits at position
/// `q * (n - 1)`; fractional positions interpolate between neighbours.
///
/// # Examples
///
/// ```
/// use faro_traits::stats::quantile;
///
/// assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.2), 1.8);
/// ```
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut valid = finite(values);
    if valid.is_empty() || !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }
    valid.sort_by(f64::total_cmp);

    let pos = q * (valid.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    valid[lower] + (valid[upper] - valid[lower]) * weight
}

/// Median of the finite values.
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_ignores_nan() {
        assert_relative_eq!(mean(&[0.1, f64::NAN, 0.3]), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // Sum of squared deviations is 32, n-1 = 7
        assert_relative_eq!(sample_std(&values), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert_relative_eq!(quantile(&values, 0.0), 1.0);
        assert_relative_eq!(quantile(&values, 1.0), 5.0);
        assert_relative_eq!(quantile(&values, 0.8), 4.2, epsilon = 1e-12);
        assert!(quantile(&values, 1.5).is_nan());
    }

    #[test]
    fn test_median_even_count() {
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&[f64::NAN]).is_nan());
    }
}
