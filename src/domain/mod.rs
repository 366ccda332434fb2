//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - spectral inputs (`Band`, `BandValues`, `SpectralSample`, `Acquisition`)
//! - derived indices (`VegetationIndices`, `IndexRasters`)
//! - estimation outputs (`MethodEstimate`, `EnsembleResult`, `ConfidenceTier`, etc.)

pub mod types;

pub use types::*;
