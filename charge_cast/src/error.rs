//! Error types for the charge_cast crate

use polars::prelude::PolarsError;
use thiserror::Error;
use volume_math::MathError;

/// Custom error types for the charge_cast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed or missing input file, column or timestamp
    #[error("Input error: {0}")]
    InputError(String),

    /// Too few rows survived loading or feature engineering
    #[error("Insufficient data: need at least {needed} rows, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Prediction or inspection requested before `fit`
    #[error("Model has not been trained")]
    ModelNotTrained,

    /// Two inputs that must line up do not
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error while writing JSON or CSV output
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error while drawing a chart
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

#[cfg(feature = "render")]
impl<E: std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ForecastError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ForecastError::Render(err.to_string())
    }
}
