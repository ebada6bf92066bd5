//! Ordinary least squares linear regression

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::Regressor;
use tracing::{info, warn};
use volume_math::{least_squares, OlsFit};

/// Linear regression with an intercept and no regularization
///
/// Holds no coefficients until trained; training again replaces the fit.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    /// Name of the model
    name: String,
    /// Fitted coefficients, once trained
    fit: Option<OlsFit>,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create an untrained model
    pub fn new() -> Self {
        Self {
            name: "Linear Regression".to_string(),
            fit: None,
        }
    }

    /// Fit on a feature table's feature columns and target
    pub fn train(&mut self, table: &FeatureTable) -> Result<()> {
        let x = table.design_matrix(table.feature_columns())?;
        let y = table.target()?;
        self.fit(&x, &y)
    }

    /// Predict every row of a feature table
    pub fn predict_table(&self, table: &FeatureTable) -> Result<Vec<f64>> {
        self.predict(&table.design_matrix(table.feature_columns())?)
    }

    /// One coefficient per feature, in training column order
    pub fn coefficients(&self) -> Result<&[f64]> {
        Ok(&self.fitted()?.coefficients)
    }

    /// Intercept term
    pub fn intercept(&self) -> Result<f64> {
        Ok(self.fitted()?.intercept)
    }

    fn fitted(&self) -> Result<&OlsFit> {
        self.fit.as_ref().ok_or(ForecastError::ModelNotTrained)
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        if y.is_empty() {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }
        if x.len() != y.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: y.len(),
                got: x.len(),
            });
        }
        let width = x[0].len();
        if let Some(row) = x.iter().find(|row| row.len() != width) {
            return Err(ForecastError::DimensionMismatch {
                expected: width,
                got: row.len(),
            });
        }

        let fit = least_squares(x, y)?;
        if !fit.dependent_columns.is_empty() {
            warn!(
                columns = ?fit.dependent_columns,
                "features carry no independent information; coefficients pinned to zero"
            );
        }
        info!(
            rows = y.len(),
            features = width,
            rank = fit.rank(),
            "trained {}",
            self.name
        );

        self.fit = Some(fit);
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let fit = self.fitted()?;
        x.iter()
            .map(|row| {
                if row.len() != fit.coefficients.len() {
                    return Err(ForecastError::DimensionMismatch {
                        expected: fit.coefficients.len(),
                        got: row.len(),
                    });
                }
                Ok(fit.predict_row(row)?)
            })
            .collect()
    }

    fn is_trained(&self) -> bool {
        self.fit.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
