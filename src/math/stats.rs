//! NaN-aware descriptive statistics.
//!
//! NaN is the no-data sentinel throughout the crate, so every reducer here skips
//! NaN explicitly (via `is_nan`) instead of letting it poison the result.

/// Mean of the non-NaN values, or NaN if there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// `(min, max)` of the non-NaN values.
pub fn nan_min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Population standard deviation of the non-NaN values.
pub fn nan_std(values: &[f64]) -> f64 {
    let mean = nan_mean(values);
    if mean.is_nan() {
        return f64::NAN;
    }
    nan_mean(&values.iter().map(|v| (v - mean) * (v - mean)).collect::<Vec<_>>()).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_skips_nan() {
        assert!((nan_mean(&[1.0, f64::NAN, 3.0]) - 2.0).abs() < 1e-12);
        assert!(nan_mean(&[f64::NAN, f64::NAN]).is_nan());
        assert!(nan_mean(&[]).is_nan());
    }

    #[test]
    fn min_max_skips_nan() {
        assert_eq!(nan_min_max(&[f64::NAN, 4.0, -1.0]), Some((-1.0, 4.0)));
        assert_eq!(nan_min_max(&[f64::NAN]), None);
    }

    #[test]
    fn std_of_constant_is_zero() {
        assert!(nan_std(&[2.0, 2.0, f64::NAN]).abs() < 1e-12);
    }
}
