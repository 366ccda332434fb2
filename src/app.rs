//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the calibration table (flag, `.env`, built-in)
//! - runs ingest + estimation + aggregation
//! - prints reports
//! - writes optional exports

use clap::Parser;
use log::info;

use crate::cli::{CalibrationArgs, Command, EstimateArgs, InputArgs, SummaryArgs, SynthArgs};
use crate::data::SynthConfig;
use crate::domain::RunConfig;
use crate::error::AppError;
use crate::indices::compute_indices;
use crate::io::{resolve_calibration, write_calibration_json};
use crate::report::pixel_stats;

pub mod pipeline;

/// Entry point for the `wheatn` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Estimate(args) => handle_estimate(args),
        Command::Indices(args) => handle_indices(args),
        Command::Summary(args) => handle_summary(args),
        Command::Synth(args) => handle_synth(args),
        Command::Calibration(args) => handle_calibration(args),
    }
}

fn handle_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let run = pipeline::run_estimation(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest, &run.series, &config.calibration)
    );
    println!("{}", crate::report::format_results_table(run.series.results()));
    println!("{}", crate::report::format_series_summary(&run.summary));
    if let Some(latest) = run.series.latest() {
        println!("{}", crate::report::format_latest_estimate(latest));
    }

    if !run.pixel_maps.is_empty() {
        let stats: Vec<_> = run.pixel_maps.iter().map(|(date, map)| pixel_stats(*date, map)).collect();
        println!("{}", crate::report::format_pixel_stats(&stats));
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::write_results_csv(path, run.series.results(), &config.calibration)?;
        info!("wrote results CSV '{}'", path.display());
    }
    if let Some(path) = &config.export_json {
        let file = crate::io::ResultsFile::new(&run.series, &config.calibration.version);
        crate::io::write_results_json(path, &file)?;
        info!("wrote results JSON '{}'", path.display());
    }

    Ok(())
}

fn handle_indices(args: InputArgs) -> Result<(), AppError> {
    let ingest = crate::io::load_acquisitions(&args.input)?;
    let rows: Vec<_> = ingest
        .acquisitions
        .iter()
        .map(|acq| (acq.date, compute_indices(&acq.sample)))
        .collect();
    println!("{}", crate::report::format_indices_table(&rows));
    Ok(())
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let file = crate::io::read_results_json(&args.results)?;
    println!(
        "Results from {} (calibration v{}, generated {})\n",
        file.tool, file.calibration_version, file.generated
    );
    let series = file.into_series();
    let summary = crate::series::summarize(&series)
        .ok_or_else(|| AppError::new(3, "Results file contains no estimates."))?;

    println!("{}", crate::report::format_results_table(series.results()));
    println!("{}", crate::report::format_series_summary(&summary));
    if let Some(latest) = series.latest() {
        println!("{}", crate::report::format_latest_estimate(latest));
    }
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = SynthConfig {
        start: args.start,
        count: args.count,
        interval_days: args.interval_days,
        width: args.width,
        height: args.height,
        seed: args.seed,
        nodata_fraction: args.nodata_fraction,
    };
    let rows = crate::data::write_synthetic_csv(&args.output, &config)?;
    println!(
        "Wrote {rows} pixel rows ({} acquisitions, {}x{}) to '{}'",
        config.count,
        config.width,
        config.height,
        args.output.display()
    );
    Ok(())
}

fn handle_calibration(args: CalibrationArgs) -> Result<(), AppError> {
    let table = resolve_calibration(args.calibration.as_deref())?;
    match &args.output {
        Some(path) => {
            write_calibration_json(path, &table)?;
            println!("Wrote calibration v{} to '{}'", table.version, path.display());
        }
        None => println!("{}", crate::report::format_calibration(&table)),
    }
    Ok(())
}

pub fn run_config_from_args(args: &EstimateArgs) -> Result<RunConfig, AppError> {
    Ok(RunConfig {
        input_csv: args.input.clone(),
        calibration: resolve_calibration(args.calibration.as_deref())?,
        pixel_maps: args.pixels,
        export_results: args.export.clone(),
        export_json: args.export_json.clone(),
    })
}
