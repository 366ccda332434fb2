//! Ensemble combination and confidence classification.
//!
//! Responsibilities:
//!
//! - R²-weight the valid per-method estimates
//! - apply the SAVI soil correction and the physiological clamp
//! - classify the combined R²/RMSE into a confidence tier

pub mod combiner;
pub mod confidence;

pub use combiner::*;
pub use confidence::*;
