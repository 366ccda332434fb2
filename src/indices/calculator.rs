//! Vegetation index formulas.
//!
//! Every index is a ratio, so each one can hit a zero denominator on dark or
//! masked pixels. Those locations become NaN ("indeterminate") rather than
//! faulting or turning into infinities; downstream code excludes them.

use rayon::prelude::*;

use crate::domain::{BandValues, IndexRasters, SpectralSample, VegetationIndices};

/// Soil brightness correction term `L` in SAVI.
const SAVI_L: f64 = 0.5;

/// Weight of the green band in the MCARI difference term.
const MCARI_GREEN_WEIGHT: f64 = 0.2;

/// `num / den`, or NaN when the quotient is indeterminate.
fn ratio(num: f64, den: f64) -> f64 {
    if num.is_nan() || den.is_nan() || den == 0.0 {
        return f64::NAN;
    }
    let q = num / den;
    if q.is_finite() { q } else { f64::NAN }
}

/// `(a - b) / (a + b)`.
pub fn normalized_difference(a: f64, b: f64) -> f64 {
    ratio(a - b, a + b)
}

pub fn ndvi(b: &BandValues) -> f64 {
    normalized_difference(b.nir, b.red)
}

pub fn ndre(b: &BandValues) -> f64 {
    normalized_difference(b.nir, b.red_edge)
}

pub fn gndvi(b: &BandValues) -> f64 {
    normalized_difference(b.nir, b.green)
}

/// Soil-adjusted vegetation index: `(1 + L)(NIR - Red) / (NIR + Red + L)`.
pub fn savi(b: &BandValues) -> f64 {
    let q = ratio(b.nir - b.red, b.nir + b.red + SAVI_L);
    (1.0 + SAVI_L) * q
}

/// Red-edge chlorophyll index: `NIR / RedEdge - 1`.
pub fn ci_red_edge(b: &BandValues) -> f64 {
    ratio(b.nir, b.red_edge) - 1.0
}

/// Modified chlorophyll absorption ratio index.
///
/// `((RE - Red) - 0.2 (RE - Green)) * (RE / Red)`
pub fn mcari(b: &BandValues) -> f64 {
    let absorption = (b.red_edge - b.red) - MCARI_GREEN_WEIGHT * (b.red_edge - b.green);
    let q = absorption * ratio(b.red_edge, b.red);
    if q.is_finite() { q } else { f64::NAN }
}

/// All six indices for one pixel or one scene mean.
pub fn indices_from_bands(b: BandValues) -> VegetationIndices {
    VegetationIndices {
        ndvi: ndvi(&b),
        ndre: ndre(&b),
        savi: savi(&b),
        gndvi: gndvi(&b),
        mcari: mcari(&b),
        ci_red_edge: ci_red_edge(&b),
    }
}

/// Per-band mean over the pixels where all five bands are present.
///
/// Returns all-NaN values when no pixel is complete.
pub fn scene_mean(sample: &SpectralSample) -> BandValues {
    let mut acc = [0.0f64; 5];
    let mut n = 0usize;
    for px in sample.pixels().filter(BandValues::is_complete) {
        acc[0] += px.blue;
        acc[1] += px.green;
        acc[2] += px.red;
        acc[3] += px.red_edge;
        acc[4] += px.nir;
        n += 1;
    }

    if n == 0 {
        return BandValues {
            blue: f64::NAN,
            green: f64::NAN,
            red: f64::NAN,
            red_edge: f64::NAN,
            nir: f64::NAN,
        };
    }

    let n = n as f64;
    BandValues {
        blue: acc[0] / n,
        green: acc[1] / n,
        red: acc[2] / n,
        red_edge: acc[3] / n,
        nir: acc[4] / n,
    }
}

/// Scene-level indices: spatially average the bands, then apply the formulas.
pub fn compute_indices(sample: &SpectralSample) -> VegetationIndices {
    indices_from_bands(scene_mean(sample))
}

/// Element-wise indices over the whole raster (parallel over pixels).
pub fn compute_index_rasters(sample: &SpectralSample) -> IndexRasters {
    let per_pixel: Vec<VegetationIndices> = (0..sample.len())
        .into_par_iter()
        .map(|idx| indices_from_bands(sample.pixel(idx)))
        .collect();

    let (rows, cols) = sample.shape();
    let n = per_pixel.len();
    let mut out = IndexRasters {
        rows,
        cols,
        ndvi: Vec::with_capacity(n),
        ndre: Vec::with_capacity(n),
        savi: Vec::with_capacity(n),
        gndvi: Vec::with_capacity(n),
        mcari: Vec::with_capacity(n),
        ci_red_edge: Vec::with_capacity(n),
    };
    for vi in per_pixel {
        out.ndvi.push(vi.ndvi);
        out.ndre.push(vi.ndre);
        out.savi.push(vi.savi);
        out.gndvi.push(vi.gndvi);
        out.mcari.push(vi.mcari);
        out.ci_red_edge.push(vi.ci_red_edge);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Band;

    fn wheat() -> BandValues {
        BandValues {
            blue: 0.05,
            green: 0.08,
            red: 0.04,
            red_edge: 0.20,
            nir: 0.45,
        }
    }

    #[test]
    fn formulas_match_hand_values() {
        let vi = indices_from_bands(wheat());
        assert!((vi.ndvi - 0.41 / 0.49).abs() < 1e-12);
        assert!((vi.ndre - 0.25 / 0.65).abs() < 1e-12);
        assert!((vi.gndvi - 0.37 / 0.53).abs() < 1e-12);
        assert!((vi.savi - 1.5 * 0.41 / 0.99).abs() < 1e-12);
        assert!((vi.ci_red_edge - (0.45 / 0.20 - 1.0)).abs() < 1e-12);
        let mcari = ((0.20 - 0.04) - 0.2 * (0.20 - 0.08)) * (0.20 / 0.04);
        assert!((vi.mcari - mcari).abs() < 1e-12);
    }

    #[test]
    fn ndvi_is_scale_invariant() {
        let base = wheat();
        let doubled = BandValues {
            nir: base.nir * 2.0,
            red: base.red * 2.0,
            ..base
        };
        assert!((ndvi(&base) - ndvi(&doubled)).abs() < 1e-12);
    }

    #[test]
    fn zero_denominators_yield_nan() {
        let dark = BandValues {
            blue: 0.0,
            green: 0.0,
            red: 0.0,
            red_edge: 0.0,
            nir: 0.0,
        };
        let vi = indices_from_bands(dark);
        assert!(vi.ndvi.is_nan());
        assert!(vi.ndre.is_nan());
        assert!(vi.gndvi.is_nan());
        assert!(vi.ci_red_edge.is_nan());
        assert!(vi.mcari.is_nan());
        // SAVI's denominator carries +0.5, so it stays defined (0 / 0.5).
        assert_eq!(vi.savi, 0.0);
    }

    #[test]
    fn zero_red_only_affects_red_ratios() {
        let b = BandValues { red: 0.0, ..wheat() };
        let vi = indices_from_bands(b);
        assert!(vi.mcari.is_nan());
        assert!((vi.ndvi - 1.0).abs() < 1e-12);
        assert!(!vi.ndre.is_nan());
    }

    #[test]
    fn nan_band_propagates() {
        let b = BandValues {
            red_edge: f64::NAN,
            ..wheat()
        };
        let vi = indices_from_bands(b);
        assert!(vi.ndre.is_nan());
        assert!(vi.ci_red_edge.is_nan());
        assert!(vi.mcari.is_nan());
        assert!(!vi.ndvi.is_nan());
        assert!(!vi.savi.is_nan());
    }

    #[test]
    fn scene_mean_skips_incomplete_pixels() {
        let sample = SpectralSample::builder(1, 3)
            .band(Band::Blue, vec![0.1, 0.3, f64::NAN])
            .band(Band::Green, vec![0.2, 0.4, 0.9])
            .band(Band::Red, vec![0.1, 0.2, 0.9])
            .band(Band::RedEdge, vec![0.3, 0.5, 0.9])
            .band(Band::Nir, vec![0.4, 0.6, 0.9])
            .build()
            .unwrap();

        let mean = scene_mean(&sample);
        assert!((mean.blue - 0.2).abs() < 1e-12);
        assert!((mean.nir - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fully_masked_scene_is_all_nan() {
        let sample = SpectralSample::scalar(BandValues {
            nir: f64::NAN,
            ..wheat()
        });
        let vi = compute_indices(&sample);
        assert!(vi.ndvi.is_nan() && vi.ndre.is_nan() && vi.savi.is_nan());
        assert!(vi.gndvi.is_nan() && vi.mcari.is_nan() && vi.ci_red_edge.is_nan());
    }

    #[test]
    fn rasters_match_scalar_formula_per_pixel() {
        let sample = SpectralSample::builder(2, 2)
            .band(Band::Blue, vec![0.05; 4])
            .band(Band::Green, vec![0.08, 0.09, 0.10, 0.0])
            .band(Band::Red, vec![0.04, 0.05, 0.0, 0.06])
            .band(Band::RedEdge, vec![0.20, 0.22, 0.25, f64::NAN])
            .band(Band::Nir, vec![0.45, 0.50, 0.55, 0.60])
            .build()
            .unwrap();

        let rasters = compute_index_rasters(&sample);
        assert_eq!((rasters.rows, rasters.cols), (2, 2));
        for idx in 0..sample.len() {
            let expected = indices_from_bands(sample.pixel(idx));
            let got = rasters.at(idx);
            for (e, g) in [
                (expected.ndvi, got.ndvi),
                (expected.ndre, got.ndre),
                (expected.savi, got.savi),
                (expected.gndvi, got.gndvi),
                (expected.mcari, got.mcari),
                (expected.ci_red_edge, got.ci_red_edge),
            ] {
                assert!((e.is_nan() && g.is_nan()) || (e - g).abs() < 1e-15);
            }
        }
        assert!(rasters.mcari[2].is_nan());
        assert!(rasters.ndre[3].is_nan());
    }
}
