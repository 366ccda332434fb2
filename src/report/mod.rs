//! Reporting utilities: per-pixel map statistics and formatted terminal output.

use chrono::NaiveDate;

use crate::estimator::NitrogenMap;
use crate::math::{nan_mean, nan_min_max, nan_std};

pub mod format;

pub use format::*;

/// Summary statistics of one per-pixel N map.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelStats {
    pub date: NaiveDate,
    pub pixels: usize,
    pub valid: usize,
    pub insufficient: usize,
    pub clamped: usize,
    pub mean: f64,
    pub std: f64,
    /// `None` when no pixel had a valid estimate.
    pub range: Option<(f64, f64)>,
}

/// Compute map statistics over the valid (non-NaN) pixels.
pub fn pixel_stats(date: NaiveDate, map: &NitrogenMap) -> PixelStats {
    PixelStats {
        date,
        pixels: map.n_percent.len(),
        valid: map.valid_pixels,
        insufficient: map.insufficient_pixels,
        clamped: map.clamped_pixels,
        mean: nan_mean(&map.n_percent),
        std: nan_std(&map.n_percent),
        range: nan_min_max(&map.n_percent),
    }
}
