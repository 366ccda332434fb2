//! Input/output helpers.
//!
//! - band CSV ingest + validation (`ingest`)
//! - result exports to CSV (`export`)
//! - results JSON read/write (`results`)
//! - calibration table files (`calibration`)

pub mod calibration;
pub mod export;
pub mod ingest;
pub mod results;

pub use calibration::*;
pub use export::*;
pub use ingest::*;
pub use results::*;
