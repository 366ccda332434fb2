//! Time-series aggregation of per-acquisition results.
//!
//! Estimates may be computed in any order (or in parallel); this module is the
//! only place that imposes chronological order.

pub mod aggregate;

pub use aggregate::*;
