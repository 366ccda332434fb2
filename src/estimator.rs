//! Estimation facade: bands in, calibrated N estimate out.
//!
//! `NitrogenEstimator` owns nothing but its calibration table, so a single
//! instance can be shared across threads; every call builds fresh values.

use chrono::NaiveDate;
use log::{debug, warn};
use rayon::prelude::*;

use crate::domain::{Acquisition, ClampEvent, EnsembleResult, SpectralSample, VegetationIndices};
use crate::ensemble::{classify, combine};
use crate::error::{AppError, EstimationError};
use crate::indices::{compute_indices, indices_from_bands};
use crate::math::nan_mean;
use crate::models::{CalibrationTable, estimate_methods};
use crate::series::{SkippedAcquisition, TimeSeries};

/// Per-pixel N content for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct NitrogenMap {
    pub rows: usize,
    pub cols: usize,
    /// Final N% per pixel (row-major); NaN where no method was valid.
    pub n_percent: Vec<f64>,
    pub valid_pixels: usize,
    pub insufficient_pixels: usize,
    pub clamped_pixels: usize,
}

impl NitrogenMap {
    /// Mean N% over the valid pixels (NaN if none).
    pub fn mean_n_percent(&self) -> f64 {
        nan_mean(&self.n_percent)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NitrogenEstimator {
    table: CalibrationTable,
}

impl NitrogenEstimator {
    /// Wrap a table as-is; the caller is responsible for `CalibrationTable::validate`.
    pub fn new(table: CalibrationTable) -> Self {
        Self { table }
    }

    /// Validate the table first (same checks as a calibration file load).
    pub fn try_new(table: CalibrationTable) -> Result<Self, AppError> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn calibration(&self) -> &CalibrationTable {
        &self.table
    }

    /// Scene-level estimate for one acquisition.
    pub fn estimate(&self, acquisition: &Acquisition) -> Result<EnsembleResult, EstimationError> {
        if acquisition.sample.is_empty() {
            return Err(EstimationError::malformed("sample has no pixels"));
        }
        let indices = compute_indices(&acquisition.sample);
        self.estimate_indices(&indices, acquisition.date)
    }

    /// Estimate from precomputed indices (e.g. from an external index pipeline).
    pub fn estimate_indices(
        &self,
        indices: &VegetationIndices,
        date: NaiveDate,
    ) -> Result<EnsembleResult, EstimationError> {
        let estimates = estimate_methods(indices, &self.table);
        let c = combine(&estimates, indices.savi, &self.table)?;
        let confidence = classify(c.weighted_r2, c.weighted_rmse, &self.table.confidence);

        debug!(
            "{date}: N={:.3}% (raw {:.3}, factor {:.2}) r2={:.3} rmse={:.3} -> {:?}",
            c.final_n_percent, c.raw_n_percent, c.soil_factor, c.weighted_r2, c.weighted_rmse, confidence
        );

        Ok(EnsembleResult {
            acquisition_date: date,
            final_n_percent: c.final_n_percent,
            raw_n_percent: c.raw_n_percent,
            corrected_n_percent: c.corrected_n_percent,
            soil_factor: c.soil_factor,
            savi: indices.savi,
            weighted_rmse: c.weighted_rmse,
            weighted_r2: c.weighted_r2,
            confidence,
            clamp: c.clamp,
            estimates: c.estimates,
            excluded: c.excluded,
        })
    }

    /// Per-pixel final N% over the whole raster (parallel over pixels).
    pub fn estimate_pixels(&self, sample: &SpectralSample) -> NitrogenMap {
        let per_pixel: Vec<Option<(f64, ClampEvent)>> = (0..sample.len())
            .into_par_iter()
            .map(|idx| {
                let indices = indices_from_bands(sample.pixel(idx));
                let estimates = estimate_methods(&indices, &self.table);
                combine(&estimates, indices.savi, &self.table)
                    .ok()
                    .map(|c| (c.final_n_percent, c.clamp))
            })
            .collect();

        let (rows, cols) = sample.shape();
        let mut map = NitrogenMap {
            rows,
            cols,
            n_percent: Vec::with_capacity(per_pixel.len()),
            valid_pixels: 0,
            insufficient_pixels: 0,
            clamped_pixels: 0,
        };
        for px in per_pixel {
            match px {
                Some((n, clamp)) => {
                    map.valid_pixels += 1;
                    if clamp.is_clamped() {
                        map.clamped_pixels += 1;
                    }
                    map.n_percent.push(n);
                }
                None => {
                    map.insufficient_pixels += 1;
                    map.n_percent.push(f64::NAN);
                }
            }
        }
        map
    }

    /// Estimate every acquisition (in parallel) and order the results by date.
    ///
    /// Acquisitions that cannot be estimated are kept as `skipped` with the reason.
    pub fn estimate_series(&self, acquisitions: &[Acquisition]) -> TimeSeries {
        let outcomes: Vec<(NaiveDate, Result<EnsembleResult, EstimationError>)> = acquisitions
            .par_iter()
            .map(|acq| (acq.date, self.estimate(acq)))
            .collect();

        let mut results = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (date, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!("Could not estimate N content for {date}: {err}");
                    skipped.push(SkippedAcquisition {
                        date,
                        reason: err.to_string(),
                    });
                }
            }
        }

        TimeSeries::from_results(results, skipped)
    }
}
