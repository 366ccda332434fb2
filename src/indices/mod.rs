//! Vegetation index calculator.
//!
//! Pure functions turning five spectral bands into NDVI, NDRE, SAVI, GNDVI,
//! MCARI and CIred-edge, either for one set of values or element-wise over a raster.

pub mod calculator;

pub use calculator::*;
