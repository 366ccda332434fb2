//! Calibration table files.
//!
//! Resolution order for the active table:
//! 1. `--calibration <JSON>` on the command line
//! 2. `WHEATN_CALIBRATION` from the environment (a `.env` file is honored)
//! 3. the built-in literature table

use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::AppError;
use crate::models::CalibrationTable;

pub const CALIBRATION_ENV: &str = "WHEATN_CALIBRATION";

/// Read and validate a calibration JSON file.
pub fn read_calibration_json(path: &Path) -> Result<CalibrationTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open calibration '{}': {e}", path.display())))?;
    let table: CalibrationTable = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid calibration JSON '{}': {e}", path.display())))?;
    table.validate()?;
    Ok(table)
}

/// Write a calibration table as pretty JSON.
pub fn write_calibration_json(path: &Path, table: &CalibrationTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create calibration '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, table)
        .map_err(|e| AppError::new(2, format!("Failed to write calibration JSON: {e}")))
}

/// Pick the calibration table for this run.
pub fn resolve_calibration(cli_path: Option<&Path>) -> Result<CalibrationTable, AppError> {
    dotenvy::dotenv().ok();
    let path = cli_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CALIBRATION_ENV).map(PathBuf::from));

    match path {
        Some(path) => {
            let table = read_calibration_json(&path)?;
            info!("using calibration '{}' (version {})", path.display(), table.version);
            Ok(table)
        }
        None => Ok(CalibrationTable::default()),
    }
}
