//! Summary statistics shared by the valuation and technical engines.
//!
//! Every helper returns `None` on input it cannot summarise (empty slices,
//! non-positive values for the harmonic mean) instead of propagating NaN into
//! downstream fair-value arithmetic.

use statrs::statistics::{Data, Median, Statistics};

/// Arithmetic mean of a data slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().mean())
}

/// Median of a data slice.
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(Data::new(data.to_vec()).median())
}

/// Harmonic mean over the strictly positive entries of `data`.
///
/// Valuation multiples are ratios, so the harmonic mean keeps a single
/// very expensive peer from dragging the baseline upward.
pub fn harmonic_mean(data: &[f64]) -> Option<f64> {
    let positive: Vec<f64> = data.iter().copied().filter(|v| *v > 0.0 && v.is_finite()).collect();
    if positive.is_empty() {
        return None;
    }
    Some(positive.iter().harmonic_mean())
}

/// Weighted mean of `(value, weight)` pairs; `None` when the weights sum to zero.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    let total_weight: f64 = pairs.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return None;
    }
    Some(pairs.iter().map(|(v, w)| v * w).sum::<f64>() / total_weight)
}

/// Compound annual growth rate in percent between two positive values.
pub fn cagr(start: f64, end: f64, periods: usize) -> Option<f64> {
    if start <= 0.0 || end <= 0.0 || periods == 0 {
        return None;
    }
    Some(((end / start).powf(1.0 / periods as f64) - 1.0) * 100.0)
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_median() {
        let data = vec![3.0, 1.0, 2.0, 10.0];
        assert_relative_eq!(mean(&data).unwrap(), 4.0);
        assert_relative_eq!(median(&data).unwrap(), 2.5);
        assert!(mean(&[]).is_none());
        assert!(median(&[]).is_none());
    }

    #[test]
    fn test_harmonic_mean_ignores_non_positive() {
        let hm = harmonic_mean(&[10.0, 20.0, -5.0, 0.0]).unwrap();
        // 2 / (1/10 + 1/20)
        assert_relative_eq!(hm, 13.333333, epsilon = 1e-5);
        assert!(harmonic_mean(&[-1.0, 0.0]).is_none());
    }

    #[test]
    fn test_weighted_mean() {
        let wm = weighted_mean(&[(10.0, 3.0), (20.0, 1.0)]).unwrap();
        assert_relative_eq!(wm, 12.5);
        assert!(weighted_mean(&[(10.0, 0.0)]).is_none());
    }

    #[test]
    fn test_cagr() {
        assert_relative_eq!(cagr(100.0, 121.0, 2).unwrap(), 10.0, epsilon = 1e-9);
        assert!(cagr(0.0, 121.0, 2).is_none());
        assert!(cagr(100.0, 121.0, 0).is_none());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(10.04999, 1), 10.0);
        assert_eq!(round_to(47.4341, 2), 47.43);
    }
}
