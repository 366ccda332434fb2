//! Calibrated per-index regression models.
//!
//! The calibration table is plain, versioned data so a locally recalibrated set of
//! coefficients can be swapped in without touching the ensemble code.

pub mod calibration;

pub use calibration::*;
