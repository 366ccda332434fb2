//! Export per-acquisition results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! plotting scripts: one row per acquisition, one column group per method.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{EnsembleResult, MethodKind};
use crate::error::AppError;
use crate::models::CalibrationTable;

/// Write results to a CSV file.
pub fn write_results_csv(path: &Path, results: &[EnsembleResult], table: &CalibrationTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(file, results, table)
}

/// Write results as CSV to any writer.
pub fn write_results<W: Write>(writer: W, results: &[EnsembleResult], table: &CalibrationTable) -> Result<(), AppError> {
    let methods: Vec<MethodKind> = table.models.iter().map(|m| m.method).collect();
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = [
        "date",
        "n_content",
        "raw_n_content",
        "corrected_n_content",
        "soil_factor",
        "savi",
        "rmse",
        "r2_mean",
        "estimation_quality",
        "clamp",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for m in &methods {
        for suffix in ["estimate", "weight", "r2", "rmse"] {
            header.push(format!("{}_{suffix}", m.column_prefix()));
        }
    }
    wtr.write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in results {
        let mut row = vec![
            r.acquisition_date.to_string(),
            format!("{:.4}", r.final_n_percent),
            format!("{:.4}", r.raw_n_percent),
            format!("{:.4}", r.corrected_n_percent),
            format!("{:.2}", r.soil_factor),
            fmt_opt(r.savi, 4),
            format!("{:.4}", r.weighted_rmse),
            format!("{:.4}", r.weighted_r2),
            r.confidence.display_name().to_string(),
            r.clamp.label().to_string(),
        ];
        for m in &methods {
            match r.estimate_for(*m) {
                Some(w) => {
                    row.push(format!("{:.4}", w.estimate.n_percent));
                    row.push(format!("{:.4}", w.weight));
                    row.push(format!("{:.2}", w.estimate.r2));
                    row.push(format!("{:.2}", w.estimate.rmse));
                }
                None => row.extend(std::iter::repeat_n(String::new(), 4)),
            }
        }
        wtr.write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn fmt_opt(v: f64, decimals: usize) -> String {
    if v.is_nan() { String::new() } else { format!("{v:.decimals$}") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::VegetationIndices;
    use crate::estimator::NitrogenEstimator;

    #[test]
    fn excluded_methods_leave_empty_cells() {
        let estimator = NitrogenEstimator::default();
        let indices = VegetationIndices {
            ndvi: 0.8,
            ndre: 0.34,
            savi: 0.45,
            gndvi: 0.7,
            mcari: f64::NAN,
            ci_red_edge: 1.61,
        };
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let result = estimator.estimate_indices(&indices, date).unwrap();

        let mut buf = Vec::new();
        write_results(&mut buf, &[result], estimator.calibration()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("date,n_content,"));
        assert!(header.ends_with("mcari_estimate,mcari_weight,mcari_r2,mcari_rmse"));

        let row = lines.next().unwrap();
        assert!(row.starts_with("2024-02-01,"));
        assert!(row.contains("High Confidence") || row.contains("Moderate Confidence"));
        assert!(row.ends_with(",,,,"));
    }
}
