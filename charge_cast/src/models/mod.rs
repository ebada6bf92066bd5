//! Regression models for charging volume forecasting

use crate::error::{ForecastError, Result};
use std::fmt::Debug;

pub mod linear_regression;

pub use linear_regression::LinearRegression;

/// A model mapping one feature row to one predicted volume
pub trait Regressor: Debug {
    /// Fit the model to row-major features `x` and targets `y`
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Predict a single row
    fn predict_one(&self, row: &[f64]) -> Result<f64> {
        self.predict(&[row.to_vec()])?
            .into_iter()
            .next()
            .ok_or(ForecastError::DimensionMismatch {
                expected: 1,
                got: 0,
            })
    }

    /// Whether `fit` has succeeded at least once
    fn is_trained(&self) -> bool;

    /// Name of the model
    fn name(&self) -> &str;
}
