//! R²-weighted ensemble of the per-method estimates.
//!
//! Steps:
//! 1. `N_raw = Σ(est_i · R²_i) / Σ R²_i` over methods whose estimate is not NaN
//! 2. multiply by the SAVI soil-background factor
//! 3. clamp to the physiological bounds, recording whether the clamp fired
//! 4. uncertainty: `RMSE_w = sqrt(Σ RMSE_i² / n)` and `R²_w = Σ R²_i² / Σ R²_i`
//!
//! Weights are re-normalized over the valid methods only, so they always sum to 1.

use log::debug;

use crate::domain::{ClampEvent, MethodEstimate, MethodKind, WeightedEstimate};
use crate::error::EstimationError;
use crate::models::{CalibrationTable, PhysiologicalBounds, SoilCorrection};

/// Output of the combiner, before confidence classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub raw_n_percent: f64,
    pub corrected_n_percent: f64,
    pub final_n_percent: f64,
    pub soil_factor: f64,
    pub clamp: ClampEvent,
    pub weighted_rmse: f64,
    pub weighted_r2: f64,
    pub estimates: Vec<WeightedEstimate>,
    pub excluded: Vec<MethodKind>,
}

/// Normalized weights `R²_i / Σ R²_valid` for the valid estimates.
///
/// Returns `None` when no estimate is valid.
pub fn ensemble_weights(estimates: &[MethodEstimate]) -> Option<Vec<WeightedEstimate>> {
    let total: f64 = estimates.iter().filter(|e| e.is_valid()).map(|e| e.r2).sum();
    if total <= 0.0 || total.is_nan() {
        return None;
    }
    Some(
        estimates
            .iter()
            .filter(|e| e.is_valid())
            .map(|e| WeightedEstimate {
                estimate: *e,
                weight: e.r2 / total,
            })
            .collect(),
    )
}

/// Soil-background factor for a scene SAVI.
pub fn soil_factor(savi: f64, correction: &SoilCorrection) -> f64 {
    if savi < correction.low_savi {
        correction.low_factor
    } else if savi > correction.high_savi {
        correction.high_factor
    } else {
        1.0
    }
}

/// Hard-clamp to the physiological range.
pub fn clamp_to_bounds(value: f64, bounds: &PhysiologicalBounds) -> (f64, ClampEvent) {
    if value < bounds.min_n_percent {
        (bounds.min_n_percent, ClampEvent::Floor)
    } else if value > bounds.max_n_percent {
        (bounds.max_n_percent, ClampEvent::Ceiling)
    } else {
        (value, ClampEvent::None)
    }
}

/// Combine per-method estimates into one calibrated, bounded N value.
pub fn combine(
    estimates: &[MethodEstimate],
    savi: f64,
    table: &CalibrationTable,
) -> Result<Combination, EstimationError> {
    let weighted = ensemble_weights(estimates).ok_or(EstimationError::InsufficientData)?;
    let excluded: Vec<MethodKind> = estimates
        .iter()
        .filter(|e| !e.is_valid())
        .map(|e| e.method)
        .collect();
    if !excluded.is_empty() {
        debug!("excluded indeterminate methods: {excluded:?}");
    }

    // With a single valid method this is exactly its estimate (weight 1.0).
    let raw_n_percent = if weighted.len() == 1 {
        weighted[0].estimate.n_percent
    } else {
        weighted.iter().map(|w| w.estimate.n_percent * w.weight).sum()
    };

    let soil_factor = soil_factor(savi, &table.soil_correction);
    let corrected_n_percent = raw_n_percent * soil_factor;
    let (final_n_percent, clamp) = clamp_to_bounds(corrected_n_percent, &table.bounds);
    if clamp.is_clamped() {
        debug!(
            "clamped N {corrected_n_percent:.3}% to {final_n_percent:.2}% ({})",
            clamp.label()
        );
    }

    let n = weighted.len() as f64;
    let weighted_rmse = (weighted.iter().map(|w| w.estimate.rmse.powi(2)).sum::<f64>() / n).sqrt();
    let weighted_r2 = weighted.iter().map(|w| w.estimate.r2 * w.weight).sum();

    Ok(Combination {
        raw_n_percent,
        corrected_n_percent,
        final_n_percent,
        soil_factor,
        clamp,
        weighted_rmse,
        weighted_r2,
        estimates: weighted,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn est(method: MethodKind, n_percent: f64, r2: f64, rmse: f64) -> MethodEstimate {
        MethodEstimate {
            method,
            n_percent,
            r2,
            rmse,
        }
    }

    fn golden() -> Vec<MethodEstimate> {
        vec![
            est(MethodKind::Ndre, 1.8276, 0.89, 0.31),
            est(MethodKind::CiRedEdge, 5.6068, 0.87, 0.34),
            est(MethodKind::Mcari, 5.4848, 0.83, 0.39),
        ]
    }

    #[test]
    fn golden_weighted_average() {
        let table = CalibrationTable::default();
        let c = combine(&golden(), 0.45, &table).unwrap();

        // (1.8276*0.89 + 5.6068*0.87 + 5.4848*0.83) / 2.59
        let expected = 11.056864 / 2.59;
        assert!((c.raw_n_percent - expected).abs() < 1e-9);
        assert!((c.raw_n_percent - 4.269).abs() < 1e-3);
        assert_eq!(c.soil_factor, 1.0);
        assert_eq!(c.clamp, ClampEvent::None);
        assert!((c.final_n_percent - expected).abs() < 1e-9);

        let rmse = ((0.31f64.powi(2) + 0.34f64.powi(2) + 0.39f64.powi(2)) / 3.0).sqrt();
        assert!((c.weighted_rmse - rmse).abs() < 1e-12);
        let r2 = (0.89f64.powi(2) + 0.87f64.powi(2) + 0.83f64.powi(2)) / 2.59;
        assert!((c.weighted_r2 - r2).abs() < 1e-12);
        assert!(c.excluded.is_empty());
    }

    #[test]
    fn weights_are_normalized_r2() {
        let weights = ensemble_weights(&golden()).unwrap();
        let sum: f64 = weights.iter().map(|w| w.weight).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!((weights[0].weight - 0.89 / 2.59).abs() < 1e-12);

        let mut partial = golden();
        partial[1].n_percent = f64::NAN;
        let weights = ensemble_weights(&partial).unwrap();
        assert_eq!(weights.len(), 2);
        assert!((weights[0].weight - 0.89 / 1.72).abs() < 1e-12);
        assert!((weights.iter().map(|w| w.weight).sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_valid_method_is_exact() {
        let table = CalibrationTable::default();
        let mut only_mcari = golden();
        only_mcari[0].n_percent = f64::NAN;
        only_mcari[1].n_percent = f64::NAN;

        let c = combine(&only_mcari, 0.45, &table).unwrap();
        assert_eq!(c.raw_n_percent, 5.4848);
        assert_eq!(c.excluded, vec![MethodKind::Ndre, MethodKind::CiRedEdge]);
        assert_eq!(c.estimates.len(), 1);
        assert_eq!(c.estimates[0].weight, 1.0);
        assert!((c.weighted_rmse - 0.39).abs() < 1e-12);
        assert!((c.weighted_r2 - 0.83).abs() < 1e-12);
    }

    #[test]
    fn zero_valid_methods_is_insufficient_data() {
        let table = CalibrationTable::default();
        let mut none = golden();
        for e in &mut none {
            e.n_percent = f64::NAN;
        }
        assert_eq!(combine(&none, 0.45, &table), Err(EstimationError::InsufficientData));
        assert_eq!(combine(&[], 0.45, &table), Err(EstimationError::InsufficientData));
    }

    #[test]
    fn soil_factor_bands_and_boundaries() {
        let s = SoilCorrection::default();
        assert_eq!(soil_factor(0.1, &s), 0.85);
        assert_eq!(soil_factor(0.19999, &s), 0.85);
        assert_eq!(soil_factor(0.2, &s), 1.0);
        assert_eq!(soil_factor(0.45, &s), 1.0);
        assert_eq!(soil_factor(0.7, &s), 1.0);
        assert_eq!(soil_factor(0.70001, &s), 1.12);
        assert_eq!(soil_factor(f64::NAN, &s), 1.0);
    }

    #[test]
    fn clamp_floor_and_ceiling_are_flagged() {
        let table = CalibrationTable::default();

        let high = vec![est(MethodKind::Ndre, 7.3, 0.89, 0.31)];
        let c = combine(&high, 0.8, &table).unwrap();
        assert!((c.corrected_n_percent - 7.3 * 1.12).abs() < 1e-12);
        assert_eq!(c.final_n_percent, 6.0);
        assert_eq!(c.clamp, ClampEvent::Ceiling);

        let low = vec![est(MethodKind::Ndre, 1.2, 0.89, 0.31)];
        let c = combine(&low, 0.1, &table).unwrap();
        assert_eq!(c.final_n_percent, 1.5);
        assert_eq!(c.clamp, ClampEvent::Floor);
    }

    #[test]
    fn clamp_invariant_over_extreme_estimates() {
        let table = CalibrationTable::default();
        for raw in [-100.0, -1.0, 0.0, 1.5, 3.3, 6.0, 9.9, 1e6] {
            for savi in [-0.5, 0.1, 0.2, 0.5, 0.7, 0.9] {
                let c = combine(&[est(MethodKind::CiRedEdge, raw, 0.87, 0.34)], savi, &table).unwrap();
                assert!((1.5..=6.0).contains(&c.final_n_percent));
            }
        }
    }
}
