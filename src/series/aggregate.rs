//! Chronological ordering and summary statistics.
//!
//! The summary mirrors what a field report needs:
//! - analysis period and observation count
//! - mean / range of N content, mean RMSE and R²
//! - per-method mean estimate and mean ensemble weight
//! - confidence-tier distribution and clamp count
//! - a linear seasonal trend (N% per day) when the dates allow one

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{ConfidenceTier, EnsembleResult, MethodKind};
use crate::math::{fit_line, nan_mean, nan_min_max};

/// An acquisition that produced no estimate, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAcquisition {
    pub date: NaiveDate,
    pub reason: String,
}

/// Results ordered by acquisition date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    results: Vec<EnsembleResult>,
    skipped: Vec<SkippedAcquisition>,
}

impl TimeSeries {
    /// Sort (stable) by acquisition date.
    pub fn from_results(mut results: Vec<EnsembleResult>, mut skipped: Vec<SkippedAcquisition>) -> Self {
        results.sort_by_key(|r| r.acquisition_date);
        skipped.sort_by_key(|s| s.date);
        Self { results, skipped }
    }

    pub fn results(&self) -> &[EnsembleResult] {
        &self.results
    }

    pub fn skipped(&self) -> &[SkippedAcquisition] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn latest(&self) -> Option<&EnsembleResult> {
        self.results.last()
    }
}

/// Per-method statistics across the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub method: MethodKind,
    /// Acquisitions where this method contributed.
    pub observations: usize,
    pub mean_estimate: f64,
    pub mean_weight: f64,
    pub r2: f64,
    pub rmse: f64,
}

/// Linear trend of final N% against days since the first acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub intercept: f64,
    pub slope_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub observations: usize,
    pub skipped: usize,
    pub mean_n_percent: f64,
    pub min_n_percent: f64,
    pub max_n_percent: f64,
    pub mean_rmse: f64,
    pub mean_r2: f64,
    pub methods: Vec<MethodSummary>,
    pub tiers: BTreeMap<ConfidenceTier, usize>,
    pub clamped: usize,
    pub trend: Option<Trend>,
}

impl SeriesSummary {
    /// Share of observations in a tier, in percent.
    pub fn tier_share(&self, tier: ConfidenceTier) -> f64 {
        let count = self.tiers.get(&tier).copied().unwrap_or(0);
        if self.observations == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.observations as f64
        }
    }
}

/// Summarize a series; `None` if it has no results.
pub fn summarize(series: &TimeSeries) -> Option<SeriesSummary> {
    let results = series.results();
    let first = results.first()?;
    let last = results.last()?;

    let n_values: Vec<f64> = results.iter().map(|r| r.final_n_percent).collect();
    let (min_n_percent, max_n_percent) = nan_min_max(&n_values)?;
    let rmse: Vec<f64> = results.iter().map(|r| r.weighted_rmse).collect();
    let r2: Vec<f64> = results.iter().map(|r| r.weighted_r2).collect();

    let mut methods = Vec::new();
    for method in MethodKind::ALL {
        let contributions: Vec<_> = results.iter().filter_map(|r| r.estimate_for(method)).collect();
        let Some(any) = contributions.first() else {
            continue;
        };
        let estimates: Vec<f64> = contributions.iter().map(|w| w.estimate.n_percent).collect();
        let weights: Vec<f64> = contributions.iter().map(|w| w.weight).collect();
        methods.push(MethodSummary {
            method,
            observations: contributions.len(),
            mean_estimate: nan_mean(&estimates),
            mean_weight: nan_mean(&weights),
            r2: any.estimate.r2,
            rmse: any.estimate.rmse,
        });
    }

    let mut tiers = BTreeMap::new();
    for r in results {
        *tiers.entry(r.confidence).or_insert(0usize) += 1;
    }

    let days: Vec<f64> = results
        .iter()
        .map(|r| (r.acquisition_date - first.acquisition_date).num_days() as f64)
        .collect();
    let trend = fit_line(&days, &n_values).map(|(intercept, slope_per_day)| Trend {
        intercept,
        slope_per_day,
    });

    Some(SeriesSummary {
        start_date: first.acquisition_date,
        end_date: last.acquisition_date,
        observations: results.len(),
        skipped: series.skipped().len(),
        mean_n_percent: nan_mean(&n_values),
        min_n_percent,
        max_n_percent,
        mean_rmse: nan_mean(&rmse),
        mean_r2: nan_mean(&r2),
        methods,
        tiers,
        clamped: results.iter().filter(|r| r.clamp.is_clamped()).count(),
        trend,
    })
}
