//! Shared "estimation pipeline" logic used by the `estimate` command.
//!
//! Keeping this in one place keeps the core workflow testable without argv:
//! band CSV ingest -> indices -> per-method models -> ensemble -> series -> summary
//!
//! The CLI layer can then focus on presentation and exports.

use chrono::NaiveDate;
use log::info;
use rayon::prelude::*;

use crate::domain::RunConfig;
use crate::error::{AppError, EstimationError};
use crate::estimator::{NitrogenEstimator, NitrogenMap};
use crate::io::ingest::{IngestedData, load_acquisitions};
use crate::series::{SeriesSummary, TimeSeries, summarize};

/// All computed outputs of a single `wheatn estimate` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub series: TimeSeries,
    pub summary: SeriesSummary,
    /// Per-pixel maps in date order; empty unless `RunConfig::pixel_maps`.
    pub pixel_maps: Vec<(NaiveDate, NitrogenMap)>,
}

/// Execute the full estimation pipeline and return the computed outputs.
pub fn run_estimation(config: &RunConfig) -> Result<RunOutput, AppError> {
    // 1) Ingest band rows.
    let ingest = load_acquisitions(&config.input_csv)?;
    run_with_ingest(config, ingest)
}

/// Execute the pipeline on already-ingested data.
pub fn run_with_ingest(config: &RunConfig, ingest: IngestedData) -> Result<RunOutput, AppError> {
    let estimator = NitrogenEstimator::try_new(config.calibration.clone())?;

    // 2) Estimate every acquisition.
    let series = estimator.estimate_series(&ingest.acquisitions);
    info!(
        "estimated {} of {} acquisitions",
        series.results().len(),
        ingest.acquisitions.len()
    );

    // 3) Summarize; nothing estimable is a data problem, not a crash.
    let summary = summarize(&series).ok_or_else(|| AppError::from(EstimationError::InsufficientData))?;

    // 4) Optional per-pixel maps.
    let pixel_maps = if config.pixel_maps {
        let maps: Vec<(NaiveDate, NitrogenMap)> = ingest
            .acquisitions
            .par_iter()
            .map(|acq| (acq.date, estimator.estimate_pixels(&acq.sample)))
            .collect();
        info!("computed {} pixel maps", maps.len());
        maps
    } else {
        Vec::new()
    };

    Ok(RunOutput {
        ingest,
        series,
        summary,
        pixel_maps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::io::ingest::read_acquisitions;
    use crate::models::CalibrationTable;

    fn config(pixel_maps: bool) -> RunConfig {
        RunConfig {
            input_csv: PathBuf::from("unused.csv"),
            calibration: CalibrationTable::default(),
            pixel_maps,
            export_results: None,
            export_json: None,
        }
    }

    #[test]
    fn estimates_series_and_pixel_maps() {
        let csv = "\
date,blue,green,red,red_edge,nir
2024-02-11,0.04,0.08,0.05,0.22,0.50
2024-02-01,0.04,0.08,0.05,0.22,0.48
2024-02-01,0.04,0.08,0.05,,0.48
";
        let ingest = read_acquisitions(csv.as_bytes()).unwrap();
        let run = run_with_ingest(&config(true), ingest).unwrap();

        assert_eq!(run.series.results().len(), 2);
        assert_eq!(run.summary.observations, 2);
        assert_eq!(run.pixel_maps.len(), 2);
        let (date, map) = &run.pixel_maps[0];
        assert_eq!(*date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(map.valid_pixels, 1);
        assert_eq!(map.insufficient_pixels, 1);
    }

    #[test]
    fn nothing_estimable_exits_with_code_3() {
        let csv = "date,blue,green,red,red_edge,nir\n2024-02-01,0.1,0.2,0.15,,\n";
        let ingest = read_acquisitions(csv.as_bytes()).unwrap();
        let err = run_with_ingest(&config(false), ingest).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
