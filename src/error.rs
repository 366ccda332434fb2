//! Error types.
//!
//! - `EstimationError` is what the pure estimation core returns.
//! - `AppError` is the binary boundary: a message plus a process exit code.
//!
//! Exit codes:
//! - 2: input or configuration problem (bad flags, missing columns, malformed samples)
//! - 3: insufficient data (nothing could be estimated)
//! - 4: internal / numeric failure

use thiserror::Error;

/// Failures surfaced by the estimation core.
///
/// Per-pixel or per-index NaNs are not errors; they are excluded locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimationError {
    /// Missing band, empty shape, or band buffers of different lengths.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// Every calibration method produced NaN, so there is nothing to weight.
    #[error("insufficient data: no calibration method produced a valid estimate")]
    InsufficientData,
}

impl EstimationError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EstimationError> for AppError {
    fn from(err: EstimationError) -> Self {
        let exit_code = match err {
            EstimationError::MalformedInput(_) => 2,
            EstimationError::InsufficientData => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
