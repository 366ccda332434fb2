//! Read/write results JSON files.
//!
//! The results JSON is the "portable" representation of a run:
//! - which calibration table produced it (version)
//! - every per-acquisition `EnsembleResult`, in date order
//! - acquisitions that were skipped, with the reason
//!
//! `wheatn summary` reloads it without recomputing anything.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::domain::EnsembleResult;
use crate::error::AppError;
use crate::series::{SkippedAcquisition, TimeSeries};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub tool: String,
    pub calibration_version: String,
    pub generated: String,
    pub results: Vec<EnsembleResult>,
    #[serde(default)]
    pub skipped: Vec<SkippedAcquisition>,
}

impl ResultsFile {
    pub fn new(series: &TimeSeries, calibration_version: &str) -> Self {
        Self {
            tool: "wheatn".to_string(),
            calibration_version: calibration_version.to_string(),
            generated: Local::now().to_rfc3339(),
            results: series.results().to_vec(),
            skipped: series.skipped().to_vec(),
        }
    }

    /// Rebuild the (date-ordered) series.
    pub fn into_series(self) -> TimeSeries {
        TimeSeries::from_results(self.results, self.skipped)
    }
}

/// Write a results JSON file.
pub fn write_results_json(path: &Path, file: &ResultsFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create results JSON '{}': {e}", path.display())))?;
    write_json(out, file)
}

/// Read a results JSON file.
pub fn read_results_json(path: &Path) -> Result<ResultsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open results JSON '{}': {e}", path.display())))?;
    read_json(file)
}

fn write_json<W: Write>(writer: W, file: &ResultsFile) -> Result<(), AppError> {
    serde_json::to_writer_pretty(writer, file)
        .map_err(|e| AppError::new(2, format!("Failed to write results JSON: {e}")))
}

fn read_json<R: Read>(reader: R) -> Result<ResultsFile, AppError> {
    serde_json::from_reader(reader).map_err(|e| AppError::new(2, format!("Invalid results JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{Acquisition, BandValues, ConfidenceTier, SpectralSample};
    use crate::estimator::NitrogenEstimator;

    #[test]
    fn reloaded_series_keeps_results_and_skips() {
        let estimator = NitrogenEstimator::default();
        let good = BandValues {
            blue: 0.04,
            green: 0.08,
            red: 0.05,
            red_edge: 0.22,
            nir: 0.48,
        };
        let masked = BandValues { nir: f64::NAN, ..good };
        let acquisitions = vec![
            Acquisition {
                date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                sample: SpectralSample::scalar(good),
            },
            Acquisition {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                sample: SpectralSample::scalar(masked),
            },
        ];
        let series = estimator.estimate_series(&acquisitions);

        let mut buf = Vec::new();
        write_json(&mut buf, &ResultsFile::new(&series, "2.0")).unwrap();
        let back = read_json(buf.as_slice()).unwrap();
        assert_eq!(back.calibration_version, "2.0");

        let reloaded = back.into_series();
        assert_eq!(reloaded.results().len(), 1);
        assert_eq!(reloaded.skipped().len(), 1);
        assert_eq!(reloaded.results()[0].confidence, ConfidenceTier::High);
        let before = series.results()[0].final_n_percent;
        assert!((reloaded.results()[0].final_n_percent - before).abs() < 1e-12);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(read_json("not json".as_bytes()).unwrap_err().exit_code(), 2);
    }
}
