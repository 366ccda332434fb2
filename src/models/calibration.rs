//! Calibration table and linear model evaluation.
//!
//! Default coefficients and validation statistics come from published winter
//! wheat studies:
//!
//! | Method     | Model                 | R²   | RMSE | Reference                  |
//! |------------|-----------------------|------|------|----------------------------|
//! | NDRE       | 4.14 · NDRE + 0.42    | 0.89 | 0.31 | Li et al. (2018)           |
//! | CIred-edge | 2.88 · CI + 0.97      | 0.87 | 0.34 | Cao et al. (2020)          |
//! | MCARI      | 3.52 · MCARI + 1.12   | 0.83 | 0.39 | Prey & Schmidhalter (2019) |
//!
//! The soil correction follows Zheng et al. (2018); the clamp bounds follow Li et al. (2018).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{MethodEstimate, MethodKind, VegetationIndices};
use crate::error::AppError;

pub const DEFAULT_CALIBRATION_VERSION: &str = "2.0";

/// One `N% = slope * index + intercept` model with fixed validation statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub method: MethodKind,
    pub slope: f64,
    pub intercept: f64,
    /// Literature-reported coefficient of determination; used as the ensemble weight.
    pub r2: f64,
    /// Literature-reported RMSE (% N).
    pub rmse: f64,
    #[serde(default)]
    pub reference: String,
}

impl LinearModel {
    /// Raw, unclamped estimate. NaN in, NaN out.
    pub fn estimate(&self, index_value: f64) -> MethodEstimate {
        let n_percent = if index_value.is_nan() {
            f64::NAN
        } else {
            self.slope * index_value + self.intercept
        };
        MethodEstimate {
            method: self.method,
            n_percent,
            r2: self.r2,
            rmse: self.rmse,
        }
    }
}

/// SAVI-banded soil background correction.
///
/// Values strictly below `low_savi` get `low_factor`, strictly above `high_savi`
/// get `high_factor`; everything else (including the thresholds and NaN) gets 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilCorrection {
    pub low_savi: f64,
    pub high_savi: f64,
    pub low_factor: f64,
    pub high_factor: f64,
}

impl Default for SoilCorrection {
    fn default() -> Self {
        Self {
            low_savi: 0.2,
            high_savi: 0.7,
            low_factor: 0.85,
            high_factor: 1.12,
        }
    }
}

/// Physiological N range for winter wheat (% dry matter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysiologicalBounds {
    pub min_n_percent: f64,
    pub max_n_percent: f64,
}

impl Default for PhysiologicalBounds {
    fn default() -> Self {
        Self {
            min_n_percent: 1.5,
            max_n_percent: 6.0,
        }
    }
}

/// Tier thresholds; both conditions of a tier must hold (strict inequalities).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub high_r2: f64,
    pub high_rmse: f64,
    pub moderate_r2: f64,
    pub moderate_rmse: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high_r2: 0.85,
            high_rmse: 0.35,
            moderate_r2: 0.75,
            moderate_rmse: 0.45,
        }
    }
}

/// Everything the estimator needs besides the bands themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    pub version: String,
    pub models: Vec<LinearModel>,
    #[serde(default)]
    pub soil_correction: SoilCorrection,
    #[serde(default)]
    pub bounds: PhysiologicalBounds,
    #[serde(default)]
    pub confidence: ConfidenceThresholds,
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self {
            version: DEFAULT_CALIBRATION_VERSION.to_string(),
            models: vec![
                LinearModel {
                    method: MethodKind::Ndre,
                    slope: 4.14,
                    intercept: 0.42,
                    r2: 0.89,
                    rmse: 0.31,
                    reference: "Li et al. (2018). Field Crops Research, 218, 159-174".to_string(),
                },
                LinearModel {
                    method: MethodKind::CiRedEdge,
                    slope: 2.88,
                    intercept: 0.97,
                    r2: 0.87,
                    rmse: 0.34,
                    reference: "Cao et al. (2020). IEEE J-STARS, 13, 2818-2832".to_string(),
                },
                LinearModel {
                    method: MethodKind::Mcari,
                    slope: 3.52,
                    intercept: 1.12,
                    r2: 0.83,
                    rmse: 0.39,
                    reference: "Prey & Schmidhalter (2019). Sensors, 19(21), 4640".to_string(),
                },
            ],
            soil_correction: SoilCorrection::default(),
            bounds: PhysiologicalBounds::default(),
            confidence: ConfidenceThresholds::default(),
        }
    }
}

impl CalibrationTable {
    pub fn model(&self, method: MethodKind) -> Option<&LinearModel> {
        self.models.iter().find(|m| m.method == method)
    }

    /// Reject tables the ensemble cannot use meaningfully.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.models.is_empty() {
            return Err(AppError::new(2, "Calibration table has no models."));
        }

        let mut seen = HashSet::new();
        for m in &self.models {
            let name = m.method.display_name();
            if !seen.insert(m.method) {
                return Err(AppError::new(2, format!("Calibration table lists {name} more than once.")));
            }
            if !(m.slope.is_finite() && m.intercept.is_finite()) {
                return Err(AppError::new(2, format!("Non-finite coefficients for {name}.")));
            }
            if !(m.r2.is_finite() && m.r2 > 0.0 && m.r2 <= 1.0) {
                return Err(AppError::new(2, format!("R² for {name} must be in (0, 1], got {}.", m.r2)));
            }
            if !(m.rmse.is_finite() && m.rmse >= 0.0) {
                return Err(AppError::new(2, format!("RMSE for {name} must be finite and >= 0.")));
            }
        }

        let b = &self.bounds;
        if !(b.min_n_percent.is_finite() && b.max_n_percent.is_finite() && b.min_n_percent < b.max_n_percent) {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid N bounds: min={}, max={} (must be finite and min<max).",
                    b.min_n_percent, b.max_n_percent
                ),
            ));
        }

        let s = &self.soil_correction;
        if !(s.low_savi.is_finite() && s.high_savi.is_finite() && s.low_savi <= s.high_savi) {
            return Err(AppError::new(2, "Invalid SAVI thresholds (must be finite and low<=high)."));
        }
        if !(s.low_factor.is_finite() && s.high_factor.is_finite() && s.low_factor > 0.0 && s.high_factor > 0.0) {
            return Err(AppError::new(2, "Soil correction factors must be finite and > 0."));
        }

        let c = &self.confidence;
        if [c.high_r2, c.high_rmse, c.moderate_r2, c.moderate_rmse]
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(AppError::new(2, "Confidence thresholds must be finite."));
        }

        Ok(())
    }
}

/// Apply every calibrated model to its index, in table order.
pub fn estimate_methods(indices: &VegetationIndices, table: &CalibrationTable) -> Vec<MethodEstimate> {
    table
        .models
        .iter()
        .map(|m| m.estimate(m.method.index_value(indices)))
        .collect()
}
