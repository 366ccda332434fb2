//! `wheat-n` library crate.
//!
//! The binary (`wheatn`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the estimator can be embedded in a larger image pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod ensemble;
pub mod error;
pub mod estimator;
pub mod indices;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod series;
