//! Seeded synthetic wheat scenes.
//!
//! Each acquisition follows a sigmoid canopy growth curve: NDVI rises from
//! early tillering (~0.3) to canopy closure (~0.9) across the series. Bands are
//! drawn around typical wheat reflectances and NIR is then solved from the
//! target NDVI so the scene lands on the curve.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Acquisition, Band, SpectralSample};
use crate::error::AppError;

const NDVI_RANGE: (f64, f64) = (0.3, 0.9);
/// Curve noise as a share of the NDVI range.
const CURVE_NOISE: f64 = 0.05;
const BAND_SD: f64 = 0.02;

/// Band means, in `Band::ALL` order. NIR is overwritten from the NDVI target.
const BAND_MEANS: [f64; 5] = [0.10, 0.20, 0.15, 0.30, 0.45];

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub start: NaiveDate,
    pub count: usize,
    pub interval_days: i64,
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    /// Share of pixels with one band blanked out.
    pub nodata_fraction: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap_or_default(),
            count: 8,
            interval_days: 10,
            width: 100,
            height: 100,
            seed: 42,
            nodata_fraction: 0.0,
        }
    }
}

impl SynthConfig {
    fn validate(&self) -> Result<(), AppError> {
        if self.count == 0 {
            return Err(AppError::new(2, "Acquisition count must be > 0."));
        }
        if self.interval_days <= 0 {
            return Err(AppError::new(2, "Interval must be at least one day."));
        }
        if self.width == 0 || self.height == 0 {
            return Err(AppError::new(2, "Scene width and height must be > 0."));
        }
        if !(0.0..1.0).contains(&self.nodata_fraction) {
            return Err(AppError::new(2, "No-data fraction must be in [0, 1)."));
        }
        self.pixel_count()?;
        self.date_at(self.count - 1)?;
        Ok(())
    }

    fn pixel_count(&self) -> Result<usize, AppError> {
        self.width
            .checked_mul(self.height)
            .ok_or_else(|| AppError::new(2, format!("Scene size {}x{} is too large.", self.width, self.height)))
    }

    /// Date of the `i`-th acquisition.
    fn date_at(&self, i: usize) -> Result<NaiveDate, AppError> {
        i64::try_from(i)
            .ok()
            .and_then(|i| self.interval_days.checked_mul(i))
            .and_then(Duration::try_days)
            .and_then(|offset| self.start.checked_add_signed(offset))
            .ok_or_else(|| {
                AppError::new(
                    2,
                    format!(
                        "Acquisition {} at {}-day intervals falls outside the supported date range.",
                        i + 1,
                        self.interval_days
                    ),
                )
            })
    }
}

/// Sigmoid over [-3, 3] scaled into `range`, with clipped Gaussian noise.
fn growth_curve(rng: &mut StdRng, count: usize, range: (f64, f64), noise: &Normal<f64>) -> Vec<f64> {
    let (lo, hi) = range;
    (0..count)
        .map(|i| {
            let x = if count == 1 {
                -3.0
            } else {
                -3.0 + 6.0 * i as f64 / (count - 1) as f64
            };
            let base = 1.0 / (1.0 + (-x).exp());
            let v = lo + (hi - lo) * base + noise.sample(rng) * (hi - lo);
            v.clamp(lo, hi)
        })
        .collect()
}

/// Generate the dated scenes described by `config`.
pub fn generate_acquisitions(config: &SynthConfig) -> Result<Vec<Acquisition>, AppError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let curve_noise = Normal::new(0.0, CURVE_NOISE)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let ndvi_curve = growth_curve(&mut rng, config.count, NDVI_RANGE, &curve_noise);

    let band_dists = BAND_MEANS
        .iter()
        .map(|&mean| Normal::new(mean, BAND_SD))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::new(4, format!("Band distribution error: {e}")))?;

    let pixels = config.pixel_count()?;
    let mut acquisitions = Vec::with_capacity(config.count);

    for (i, &ndvi) in ndvi_curve.iter().enumerate() {
        let date = config.date_at(i)?;
        let mut bands: [Vec<f64>; 5] = Default::default();
        for values in bands.iter_mut() {
            values.reserve(pixels);
        }

        for _ in 0..pixels {
            let mut px = [0.0; 5];
            for (v, dist) in px.iter_mut().zip(&band_dists) {
                *v = dist.sample(&mut rng).max(0.0);
            }
            // Band::ALL order: blue, green, red, red_edge, nir.
            px[4] = px[2] * (1.0 + ndvi) / (1.0 - ndvi);

            if config.nodata_fraction > 0.0 && rng.r#gen::<f64>() < config.nodata_fraction {
                px[rng.gen_range(0..5)] = f64::NAN;
            }
            for (values, v) in bands.iter_mut().zip(px) {
                values.push(v);
            }
        }

        let [blue, green, red, red_edge, nir] = bands;
        let sample = SpectralSample::builder(config.height, config.width)
            .band(Band::Blue, blue)
            .band(Band::Green, green)
            .band(Band::Red, red)
            .band(Band::RedEdge, red_edge)
            .band(Band::Nir, nir)
            .build()?;
        acquisitions.push(Acquisition { date, sample });
    }

    Ok(acquisitions)
}

/// Write acquisitions as a band CSV that `wheatn estimate` can ingest.
/// Returns the number of pixel rows written.
pub fn write_band_csv<W: Write>(writer: W, acquisitions: &[Acquisition]) -> Result<usize, AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["date"];
    header.extend(Band::ALL.iter().map(|b| b.column()));
    wtr.write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write band CSV header: {e}")))?;

    let mut rows = 0usize;
    for acq in acquisitions {
        let date = acq.date.to_string();
        for px in acq.sample.pixels() {
            let cells = [px.blue, px.green, px.red, px.red_edge, px.nir];
            let mut record = Vec::with_capacity(6);
            record.push(date.clone());
            record.extend(cells.iter().map(|v| if v.is_nan() { String::new() } else { format!("{v:.6}") }));
            wtr.write_record(&record)
                .map_err(|e| AppError::new(2, format!("Failed to write band CSV row: {e}")))?;
            rows += 1;
        }
    }

    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush band CSV: {e}")))?;
    Ok(rows)
}

/// Generate scenes and write them to `path`.
pub fn write_synthetic_csv(path: &Path, config: &SynthConfig) -> Result<usize, AppError> {
    let acquisitions = generate_acquisitions(config)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    write_band_csv(file, &acquisitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::compute_indices;
    use crate::io::read_acquisitions;

    fn small() -> SynthConfig {
        SynthConfig {
            count: 4,
            width: 6,
            height: 5,
            ..SynthConfig::default()
        }
    }

    #[test]
    fn same_seed_same_scenes() {
        let a = generate_acquisitions(&small()).unwrap();
        let b = generate_acquisitions(&small()).unwrap();
        assert_eq!(a.len(), 4);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.date, y.date);
            assert_eq!(x.sample.band(Band::Nir), y.sample.band(Band::Nir));
        }

        let other = generate_acquisitions(&SynthConfig { seed: 7, ..small() }).unwrap();
        assert_ne!(a[0].sample.band(Band::Red), other[0].sample.band(Band::Red));
    }

    #[test]
    fn dates_step_by_interval_and_ndvi_grows() {
        let scenes = generate_acquisitions(&small()).unwrap();
        assert_eq!(scenes[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(scenes[3].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(scenes[0].sample.shape(), (5, 6));

        let first = compute_indices(&scenes[0].sample).ndvi;
        let last = compute_indices(&scenes[3].sample).ndvi;
        assert!(first < 0.5, "early ndvi {first}");
        assert!(last > 0.7, "late ndvi {last}");
    }

    #[test]
    fn written_csv_ingests() {
        let config = SynthConfig {
            nodata_fraction: 0.2,
            ..small()
        };
        let scenes = generate_acquisitions(&config).unwrap();
        let mut buf = Vec::new();
        let rows = write_band_csv(&mut buf, &scenes).unwrap();
        assert_eq!(rows, 4 * 30);

        let data = read_acquisitions(buf.as_slice()).unwrap();
        assert_eq!(data.rows_used, rows);
        assert!(data.row_errors.is_empty());
        assert_eq!(data.acquisitions.len(), 4);
        let masked: usize = scenes
            .iter()
            .map(|a| a.sample.pixels().filter(|p| !p.is_complete()).count())
            .sum();
        assert_eq!(data.masked_values, masked);
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(generate_acquisitions(&SynthConfig { count: 0, ..small() }).is_err());
        assert!(generate_acquisitions(&SynthConfig { nodata_fraction: 1.0, ..small() }).is_err());
        assert!(generate_acquisitions(&SynthConfig { interval_days: 0, ..small() }).is_err());

        let far = SynthConfig {
            interval_days: 10_000_000_000,
            ..small()
        };
        assert_eq!(generate_acquisitions(&far).unwrap_err().exit_code(), 2);
        let huge = SynthConfig {
            width: usize::MAX,
            height: 2,
            ..small()
        };
        assert_eq!(generate_acquisitions(&huge).unwrap_err().exit_code(), 2);
    }
}
