//! Confidence classification from the ensemble's weighted R² and RMSE.
//!
//! Tiers are checked top-down and both conditions of a tier must hold.

use crate::domain::ConfidenceTier;
use crate::models::ConfidenceThresholds;

pub fn classify(weighted_r2: f64, weighted_rmse: f64, thresholds: &ConfidenceThresholds) -> ConfidenceTier {
    if weighted_r2 > thresholds.high_r2 && weighted_rmse < thresholds.high_rmse {
        ConfidenceTier::High
    } else if weighted_r2 > thresholds.moderate_r2 && weighted_rmse < thresholds.moderate_rmse {
        ConfidenceTier::Moderate
    } else {
        ConfidenceTier::Low
    }
}
