//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the pure estimation core
//! - exported to JSON/CSV
//! - reloaded later for summaries and comparisons

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EstimationError;

/// One of the five spectral bands recorded by the multispectral camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Blue,
    Green,
    Red,
    RedEdge,
    Nir,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Blue, Band::Green, Band::Red, Band::RedEdge, Band::Nir];

    /// Canonical CSV column name.
    pub fn column(self) -> &'static str {
        match self {
            Band::Blue => "blue",
            Band::Green => "green",
            Band::Red => "red",
            Band::RedEdge => "red_edge",
            Band::Nir => "nir",
        }
    }

    fn slot(self) -> usize {
        match self {
            Band::Blue => 0,
            Band::Green => 1,
            Band::Red => 2,
            Band::RedEdge => 3,
            Band::Nir => 4,
        }
    }
}

/// Reflectances of one pixel (or one scene mean), each nominally in `[0, 1]`.
///
/// NaN marks a masked (no-data) measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandValues {
    pub blue: f64,
    pub green: f64,
    pub red: f64,
    pub red_edge: f64,
    pub nir: f64,
}

impl BandValues {
    /// True when no band is masked.
    pub fn is_complete(&self) -> bool {
        !(self.blue.is_nan()
            || self.green.is_nan()
            || self.red.is_nan()
            || self.red_edge.is_nan()
            || self.nir.is_nan())
    }
}

/// A registered set of five co-located band rasters.
///
/// All bands share the same `(rows, cols)` shape; this is enforced at build time,
/// so downstream code can index every band with the same pixel offset.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralSample {
    rows: usize,
    cols: usize,
    bands: [Vec<f64>; 5],
}

impl SpectralSample {
    /// Start building a `rows x cols` sample.
    pub fn builder(rows: usize, cols: usize) -> SpectralSampleBuilder {
        SpectralSampleBuilder {
            rows,
            cols,
            bands: Default::default(),
        }
    }

    /// A 1x1 sample, e.g. spatially averaged reflectances.
    pub fn scalar(values: BandValues) -> Self {
        Self {
            rows: 1,
            cols: 1,
            bands: [
                vec![values.blue],
                vec![values.green],
                vec![values.red],
                vec![values.red_edge],
                vec![values.nir],
            ],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.bands[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn band(&self, band: Band) -> &[f64] {
        &self.bands[band.slot()]
    }

    /// Band values at a flat (row-major) pixel offset.
    ///
    /// # Panics
    /// Panics if `idx >= self.len()`.
    pub fn pixel(&self, idx: usize) -> BandValues {
        BandValues {
            blue: self.bands[0][idx],
            green: self.bands[1][idx],
            red: self.bands[2][idx],
            red_edge: self.bands[3][idx],
            nir: self.bands[4][idx],
        }
    }

    pub fn pixels(&self) -> impl Iterator<Item = BandValues> + '_ {
        (0..self.len()).map(|idx| self.pixel(idx))
    }
}

/// Validating builder for `SpectralSample`.
#[derive(Debug, Clone)]
pub struct SpectralSampleBuilder {
    rows: usize,
    cols: usize,
    bands: [Option<Vec<f64>>; 5],
}

impl SpectralSampleBuilder {
    pub fn band(mut self, band: Band, values: Vec<f64>) -> Self {
        self.bands[band.slot()] = Some(values);
        self
    }

    pub fn build(self) -> Result<SpectralSample, EstimationError> {
        let (rows, cols) = (self.rows, self.cols);
        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| EstimationError::malformed(format!("sample shape {rows}x{cols} overflows")))?;
        if expected == 0 {
            return Err(EstimationError::malformed(format!("empty sample shape {rows}x{cols}")));
        }

        let [blue, green, red, red_edge, nir] = self.bands;
        let checked = |band: Band, values: Option<Vec<f64>>| -> Result<Vec<f64>, EstimationError> {
            let values = values
                .ok_or_else(|| EstimationError::malformed(format!("missing band `{}`", band.column())))?;
            if values.len() != expected {
                return Err(EstimationError::malformed(format!(
                    "band `{}` has {} values, expected {expected} ({rows}x{cols})",
                    band.column(),
                    values.len(),
                )));
            }
            Ok(values)
        };

        Ok(SpectralSample {
            rows,
            cols,
            bands: [
                checked(Band::Blue, blue)?,
                checked(Band::Green, green)?,
                checked(Band::Red, red)?,
                checked(Band::RedEdge, red_edge)?,
                checked(Band::Nir, nir)?,
            ],
        })
    }
}

/// One dated acquisition handed to the estimator by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub date: NaiveDate,
    pub sample: SpectralSample,
}

/// The six vegetation indices derived from one set of band values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VegetationIndices {
    #[serde(with = "nan_as_null")]
    pub ndvi: f64,
    #[serde(with = "nan_as_null")]
    pub ndre: f64,
    #[serde(with = "nan_as_null")]
    pub savi: f64,
    #[serde(with = "nan_as_null")]
    pub gndvi: f64,
    #[serde(with = "nan_as_null")]
    pub mcari: f64,
    #[serde(with = "nan_as_null")]
    pub ci_red_edge: f64,
}

/// Per-pixel index buffers sharing the shape of their source sample.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRasters {
    pub rows: usize,
    pub cols: usize,
    pub ndvi: Vec<f64>,
    pub ndre: Vec<f64>,
    pub savi: Vec<f64>,
    pub gndvi: Vec<f64>,
    pub mcari: Vec<f64>,
    pub ci_red_edge: Vec<f64>,
}

impl IndexRasters {
    /// Indices at a flat pixel offset.
    pub fn at(&self, idx: usize) -> VegetationIndices {
        VegetationIndices {
            ndvi: self.ndvi[idx],
            ndre: self.ndre[idx],
            savi: self.savi[idx],
            gndvi: self.gndvi[idx],
            mcari: self.mcari[idx],
            ci_red_edge: self.ci_red_edge[idx],
        }
    }
}

/// Calibrated regression methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Ndre,
    CiRedEdge,
    Mcari,
}

impl MethodKind {
    pub const ALL: [MethodKind; 3] = [MethodKind::Ndre, MethodKind::CiRedEdge, MethodKind::Mcari];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            MethodKind::Ndre => "NDRE",
            MethodKind::CiRedEdge => "CIred-edge",
            MethodKind::Mcari => "MCARI",
        }
    }

    /// Column prefix used in CSV exports.
    pub fn column_prefix(self) -> &'static str {
        match self {
            MethodKind::Ndre => "ndre",
            MethodKind::CiRedEdge => "ci_red_edge",
            MethodKind::Mcari => "mcari",
        }
    }

    /// The index this method regresses on.
    pub fn index_value(self, indices: &VegetationIndices) -> f64 {
        match self {
            MethodKind::Ndre => indices.ndre,
            MethodKind::CiRedEdge => indices.ci_red_edge,
            MethodKind::Mcari => indices.mcari,
        }
    }
}

/// Output of one calibration model.
///
/// `r2` and `rmse` are the model's fixed validation statistics, not fit at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodEstimate {
    pub method: MethodKind,
    #[serde(with = "nan_as_null")]
    pub n_percent: f64,
    pub r2: f64,
    pub rmse: f64,
}

impl MethodEstimate {
    pub fn is_valid(&self) -> bool {
        !self.n_percent.is_nan()
    }
}

/// A valid method estimate together with its normalized ensemble weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedEstimate {
    pub estimate: MethodEstimate,
    pub weight: f64,
}

/// Whether the physiological clamp changed the corrected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClampEvent {
    #[default]
    None,
    /// Corrected value was below the deficiency floor.
    Floor,
    /// Corrected value was above the luxury-consumption ceiling.
    Ceiling,
}

impl ClampEvent {
    pub fn is_clamped(self) -> bool {
        self != ClampEvent::None
    }

    pub fn label(self) -> &'static str {
        match self {
            ClampEvent::None => "none",
            ClampEvent::Floor => "floor",
            ClampEvent::Ceiling => "ceiling",
        }
    }
}

/// Discrete confidence classification of an ensemble result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Moderate,
    Low,
}

impl ConfidenceTier {
    pub const ALL: [ConfidenceTier; 3] = [ConfidenceTier::High, ConfidenceTier::Moderate, ConfidenceTier::Low];

    pub fn display_name(self) -> &'static str {
        match self {
            ConfidenceTier::High => "High Confidence",
            ConfidenceTier::Moderate => "Moderate Confidence",
            ConfidenceTier::Low => "Low Confidence",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Moderate => "moderate",
            ConfidenceTier::Low => "low",
        }
    }
}

/// Calibrated, bounded N estimate for one acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub acquisition_date: NaiveDate,
    /// Clamped, soil-corrected N content (% dry matter).
    pub final_n_percent: f64,
    /// R²-weighted mean of the valid method estimates.
    pub raw_n_percent: f64,
    /// `raw_n_percent * soil_factor`, before clamping.
    pub corrected_n_percent: f64,
    pub soil_factor: f64,
    #[serde(with = "nan_as_null")]
    pub savi: f64,
    pub weighted_rmse: f64,
    pub weighted_r2: f64,
    pub confidence: ConfidenceTier,
    pub clamp: ClampEvent,
    /// Methods that contributed, in calibration-table order.
    pub estimates: Vec<WeightedEstimate>,
    /// Methods excluded because their index was indeterminate.
    pub excluded: Vec<MethodKind>,
}

impl EnsembleResult {
    pub fn estimate_for(&self, method: MethodKind) -> Option<&WeightedEstimate> {
        self.estimates.iter().find(|w| w.estimate.method == method)
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, `.env`, and the calibration file.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_csv: PathBuf,
    pub calibration: crate::models::CalibrationTable,
    /// Also compute per-pixel N maps for each acquisition.
    pub pixel_maps: bool,
    pub export_results: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Serialize NaN as `null` (JSON has no NaN) and read `null` back as NaN.
pub mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(v: f64) -> Vec<f64> {
        vec![v; 6]
    }

    #[test]
    fn builder_accepts_matching_bands() {
        let sample = SpectralSample::builder(2, 3)
            .band(Band::Blue, values(0.1))
            .band(Band::Green, values(0.2))
            .band(Band::Red, values(0.15))
            .band(Band::RedEdge, values(0.3))
            .band(Band::Nir, values(0.45))
            .build()
            .unwrap();

        assert_eq!(sample.shape(), (2, 3));
        assert_eq!(sample.len(), 6);
        assert_eq!(sample.pixel(5).red_edge, 0.3);
        assert_eq!(sample.band(Band::Nir).len(), 6);
    }

    #[test]
    fn builder_rejects_missing_band() {
        let err = SpectralSample::builder(2, 3)
            .band(Band::Blue, values(0.1))
            .band(Band::Green, values(0.2))
            .band(Band::Red, values(0.15))
            .band(Band::Nir, values(0.45))
            .build()
            .unwrap_err();

        assert!(matches!(err, EstimationError::MalformedInput(ref m) if m.contains("red_edge")));
    }

    #[test]
    fn builder_rejects_shape_mismatch() {
        let err = SpectralSample::builder(2, 3)
            .band(Band::Blue, values(0.1))
            .band(Band::Green, values(0.2))
            .band(Band::Red, vec![0.15; 5])
            .band(Band::RedEdge, values(0.3))
            .band(Band::Nir, values(0.45))
            .build()
            .unwrap_err();

        assert!(matches!(err, EstimationError::MalformedInput(ref m) if m.contains("`red` has 5 values")));
    }

    #[test]
    fn builder_rejects_empty_shape() {
        let err = SpectralSample::builder(0, 4).build().unwrap_err();
        assert!(matches!(err, EstimationError::MalformedInput(_)));
    }

    #[test]
    fn builder_rejects_overflowing_shape() {
        let err = SpectralSample::builder(usize::MAX, 2)
            .band(Band::Blue, values(0.1))
            .build()
            .unwrap_err();
        assert!(matches!(err, EstimationError::MalformedInput(ref m) if m.contains("overflows")));
    }

    #[test]
    fn nan_fields_survive_json() {
        let estimate = MethodEstimate {
            method: MethodKind::Mcari,
            n_percent: f64::NAN,
            r2: 0.83,
            rmse: 0.39,
        };
        let json = serde_json::to_string(&estimate).unwrap();
        assert!(json.contains("\"n_percent\":null"));

        let back: MethodEstimate = serde_json::from_str(&json).unwrap();
        assert!(back.n_percent.is_nan());
        assert!(!back.is_valid());
    }

    #[test]
    fn incomplete_pixel_detected() {
        let px = BandValues {
            blue: 0.1,
            green: 0.2,
            red: f64::NAN,
            red_edge: 0.3,
            nir: 0.4,
        };
        assert!(!px.is_complete());
    }
}
