//! CSV ingest of per-pixel band values.
//!
//! The image loader (GeoTIFF reading, georeferencing) lives outside this crate;
//! what reaches us is a flat CSV with one row per pixel:
//!
//! ```text
//! date,blue,green,red,red_edge,nir
//! 2024-02-01,0.10,0.20,0.15,0.30,0.45
//! ```
//!
//! Rows sharing a date form one acquisition.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No-data stays NaN**: empty cells and `nan` / `nodata` are masked pixels,
//!   never zeros

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use log::{debug, info};

use crate::domain::{Acquisition, Band, SpectralSample};
use crate::error::{AppError, EstimationError};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: dated acquisitions (sorted by date) + row diagnostics.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub acquisitions: Vec<Acquisition>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Band cells read as no-data.
    pub masked_values: usize,
}

/// Open and ingest a band CSV.
pub fn load_acquisitions(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = read_acquisitions(file)?;
    info!(
        "read {} rows from '{}' ({} used, {} row errors, {} acquisitions)",
        data.rows_read,
        path.display(),
        data.rows_used,
        data.row_errors.len(),
        data.acquisitions.len()
    );
    Ok(data)
}

/// Ingest band rows from any reader.
pub fn read_acquisitions<R: Read>(reader: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = resolve_columns(&headers)?;

    let mut grouped: BTreeMap<NaiveDate, [Vec<f64>; 5]> = BTreeMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_used = 0usize;
    let mut masked_values = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Ok((date, values)) => {
                masked_values += values.iter().filter(|v| v.is_nan()).count();
                let bands = grouped.entry(date).or_default();
                for (slot, v) in bands.iter_mut().zip(values) {
                    slot.push(v);
                }
                rows_used += 1;
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if grouped.is_empty() {
        return Err(AppError::new(2, "No valid band rows found in CSV."));
    }

    let mut acquisitions = Vec::with_capacity(grouped.len());
    for (date, [blue, green, red, red_edge, nir]) in grouped {
        debug!("{date}: {} pixels", blue.len());
        let sample = SpectralSample::builder(1, blue.len())
            .band(Band::Blue, blue)
            .band(Band::Green, green)
            .band(Band::Red, red)
            .band(Band::RedEdge, red_edge)
            .band(Band::Nir, nir)
            .build()?;
        acquisitions.push(Acquisition { date, sample });
    }

    Ok(IngestedData {
        acquisitions,
        row_errors,
        rows_read,
        rows_used,
        masked_values,
    })
}

/// Column positions of `date` and the five bands.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    bands: [usize; 5],
}

fn resolve_columns(headers: &StringRecord) -> Result<Columns, AppError> {
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect();

    let date = *header_map
        .get("date")
        .ok_or_else(|| AppError::new(2, "Missing required column: `date`"))?;

    let mut bands = [0usize; 5];
    for (slot, band) in bands.iter_mut().zip(Band::ALL) {
        *slot = band_aliases(band)
            .iter()
            .find_map(|alias| header_map.get(*alias).copied())
            .ok_or_else(|| {
                AppError::from(EstimationError::malformed(format!(
                    "missing band `{}` (no matching CSV column)",
                    band.column()
                )))
            })?;
    }

    Ok(Columns { date, bands })
}

fn band_aliases(band: Band) -> &'static [&'static str] {
    match band {
        Band::Blue => &["blue", "b"],
        Band::Green => &["green", "g"],
        Band::Red => &["red", "r"],
        Band::RedEdge => &["red_edge", "rededge", "re"],
        Band::Nir => &["nir", "near_infrared"],
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase().replace(['-', ' '], "_")
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<(NaiveDate, [f64; 5]), String> {
    let raw_date = record
        .get(columns.date)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing required value: `date`".to_string())?;
    let date = parse_date(raw_date)?;

    let mut values = [f64::NAN; 5];
    for ((value, &col), band) in values.iter_mut().zip(columns.bands.iter()).zip(Band::ALL) {
        *value = parse_reflectance(record.get(col)).map_err(|e| format!("`{}`: {e}", band.column()))?;
    }
    Ok((date, values))
}

/// Parse one band cell; empty and no-data markers become NaN.
///
/// A field missing from a short row is an error, not no-data.
fn parse_reflectance(cell: Option<&str>) -> Result<f64, String> {
    let s = cell.map(str::trim).ok_or_else(|| "missing field".to_string())?;
    if s.is_empty() || ["nan", "na", "nodata", "null"].iter().any(|m| s.eq_ignore_ascii_case(m)) {
        return Ok(f64::NAN);
    }
    let v = s.parse::<f64>().map_err(|_| format!("invalid number '{s}'"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("non-finite value '{s}'"))
    }
}

/// Accepts ISO dates and the compact `YYYYMMDD` stamp used in image file names.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y%m%d", "%d/%m/%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYYMMDD, DD/MM/YYYY, YYYY/MM/DD."
    ))
}
