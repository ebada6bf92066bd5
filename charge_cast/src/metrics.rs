//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use crate::models::LinearRegression;
use crate::utils::round_to;
use serde::Serialize;
use std::cmp::Ordering;

/// Added to the actual value in the MAPE denominator
pub const MAPE_EPSILON: f64 = 1e-8;

/// Forecast accuracy metrics, rounded for reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    /// Mean Absolute Error (4 decimals)
    #[serde(rename = "MAE")]
    pub mae: f64,
    /// Root Mean Squared Error (4 decimals)
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Coefficient of determination (4 decimals)
    #[serde(rename = "R2 Score")]
    pub r2: f64,
    /// Mean Absolute Percentage Error, in percent (2 decimals)
    #[serde(rename = "MAPE (%)")]
    pub mape: f64,
}

impl EvaluationMetrics {
    /// Metric name and value pairs in reporting order
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("MAE", self.mae),
            ("RMSE", self.rmse),
            ("R2 Score", self.r2),
            ("MAPE (%)", self.mape),
        ]
    }
}

impl std::fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Performance Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  R2:    {:.4}", self.r2)?;
        writeln!(f, "  MAPE:  {:.2}%", self.mape)?;
        Ok(())
    }
}

/// Compare predictions against actual values
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<EvaluationMetrics> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }

    let n = actual.len() as f64;
    let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let sse = errors.iter().map(|e| e * e).sum::<f64>();
    let rmse = (sse / n).sqrt();

    let mean = actual.iter().sum::<f64>() / n;
    let sst = actual.iter().map(|a| (a - mean).powi(2)).sum::<f64>();
    let r2 = if sst == 0.0 {
        // Constant actual values: perfect only if every error is zero
        if sse == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - sse / sst
    };

    let mape = actual
        .iter()
        .zip(&errors)
        .map(|(a, e)| (e / (a + MAPE_EPSILON)).abs())
        .sum::<f64>()
        / n
        * 100.0;

    Ok(EvaluationMetrics {
        mae: round_to(mae, 4),
        rmse: round_to(rmse, 4),
        r2: round_to(r2, 4),
        mape: round_to(mape, 2),
    })
}

/// Absolute coefficient per feature, largest first; ties keep column order
pub fn feature_importance(
    model: &LinearRegression,
    feature_names: &[String],
) -> Result<Vec<(String, f64)>> {
    let coefficients = model.coefficients()?;
    if coefficients.len() != feature_names.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: coefficients.len(),
            got: feature_names.len(),
        });
    }

    let mut importance: Vec<(String, f64)> = feature_names
        .iter()
        .cloned()
        .zip(coefficients.iter().map(|c| c.abs()))
        .collect();
    importance.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    Ok(importance)
}
