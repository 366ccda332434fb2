//! Command-line parsing for the wheat nitrogen estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the index/model/ensemble code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "wheatn", version, about = "Wheat canopy nitrogen estimation from multispectral bands")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate canopy N% for every acquisition in a band CSV.
    Estimate(EstimateArgs),
    /// Print the scene-mean vegetation indices per acquisition.
    Indices(InputArgs),
    /// Summarize a results JSON written by `wheatn estimate --export-json`.
    Summary(SummaryArgs),
    /// Write a seeded synthetic band CSV.
    Synth(SynthArgs),
    /// Print (or write) the active calibration table.
    Calibration(CalibrationArgs),
}

/// Options for estimation runs.
#[derive(Debug, Parser, Clone)]
pub struct EstimateArgs {
    /// Band CSV (`date,blue,green,red,red_edge,nir`, one row per pixel).
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// Calibration table JSON (falls back to $WHEATN_CALIBRATION, then the built-in table).
    #[arg(short = 'c', long, value_name = "JSON")]
    pub calibration: Option<PathBuf>,

    /// Export per-acquisition results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export results (plus skipped acquisitions) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Also compute per-pixel nitrogen maps and print their statistics.
    #[arg(long)]
    pub pixels: bool,
}

/// Input-only options.
#[derive(Debug, Parser, Clone)]
pub struct InputArgs {
    /// Band CSV (`date,blue,green,red,red_edge,nir`, one row per pixel).
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,
}

#[derive(Debug, Parser)]
pub struct SummaryArgs {
    /// Results JSON produced by `wheatn estimate --export-json`.
    #[arg(long, value_name = "JSON")]
    pub results: PathBuf,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser)]
pub struct SynthArgs {
    /// Output band CSV.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,

    /// First acquisition date (YYYY-MM-DD).
    #[arg(long, default_value = "2024-02-01", value_parser = parse_day)]
    pub start: NaiveDate,

    /// Number of acquisitions.
    #[arg(short = 'n', long, default_value_t = 8)]
    pub count: usize,

    /// Days between acquisitions.
    #[arg(long, default_value_t = 10)]
    pub interval_days: i64,

    /// Scene width (pixels).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Scene height (pixels).
    #[arg(long, default_value_t = 100)]
    pub height: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Share of pixels with one band left empty (no-data).
    #[arg(long, default_value_t = 0.0)]
    pub nodata_fraction: f64,
}

#[derive(Debug, Parser)]
pub struct CalibrationArgs {
    /// Calibration table JSON to show instead of the resolved one.
    #[arg(short = 'c', long, value_name = "JSON")]
    pub calibration: Option<PathBuf>,

    /// Write the table to this path instead of printing it.
    #[arg(short = 'o', long, value_name = "JSON")]
    pub output: Option<PathBuf>,
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    crate::io::parse_date(s)
}
