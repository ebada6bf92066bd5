//! # Volume Math
//!
//! Numeric building blocks for charging volume analysis.
//! This crate provides the trailing window statistics, the cyclical
//! calendar encodings and the least squares solver used by `charge_cast`.

use thiserror::Error;

pub mod cyclical;
pub mod regression;
pub mod rolling;

pub use cyclical::{day_of_week_encoding, hour_encoding, CyclicalEncoding};
pub use regression::{least_squares, OlsFit};
pub use rolling::{rolling_mean, rolling_std, RollingWindow};

/// Errors that can occur in volume calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for volume math operations
pub type Result<T> = std::result::Result<T, MathError>;
