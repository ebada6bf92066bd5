//! Pipeline parameters
//!
//! Every knob of the pipeline is a plain number with a default, so a
//! partial JSON file only needs to name the values it changes.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Name of the derived total volume column
pub const TOTAL_VOLUME: &str = "total_volume";

/// Parameters for feature engineering, splitting, forecasting and reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Column the lag and rolling features are derived from
    pub target_column: String,
    /// Lag offsets, in rows
    pub lags: Vec<usize>,
    /// Rolling window sizes, in rows
    pub windows: Vec<usize>,
    /// Fraction of rows assigned to the training prefix
    pub train_ratio: f64,
    /// Forecast horizon, in hourly steps
    pub forecast_steps: usize,
    /// Number of peak hours reported
    pub peak_hours_top_n: usize,
    /// Number of peak days reported
    pub peak_days_top_n: usize,
    /// Number of features shown on the importance chart
    pub importance_top_n: usize,
    /// Histogram bins for the residuals chart
    pub residual_bins: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: TOTAL_VOLUME.to_string(),
            lags: vec![1, 2, 3, 6, 12, 24],
            windows: vec![6, 12, 24],
            train_ratio: 0.8,
            forecast_steps: 24,
            peak_hours_top_n: 5,
            peak_days_top_n: 3,
            importance_top_n: 10,
            residual_bins: 50,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; missing keys keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter is usable
    pub fn validate(&self) -> Result<()> {
        if self.target_column.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Target column name must not be empty".to_string(),
            ));
        }
        if self.lags.iter().any(|&lag| lag == 0) {
            return Err(ForecastError::InvalidParameter(
                "Lags must be positive".to_string(),
            ));
        }
        if self.windows.iter().any(|&window| window < 2) {
            return Err(ForecastError::InvalidParameter(
                "Rolling windows must span at least 2 rows".to_string(),
            ));
        }
        // both sides of the split need rows: one to fit, one to evaluate
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Train ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        if self.peak_hours_top_n == 0 || self.peak_days_top_n == 0 || self.importance_top_n == 0 {
            return Err(ForecastError::InvalidParameter(
                "Top-N counts must be positive".to_string(),
            ));
        }
        if self.residual_bins == 0 {
            return Err(ForecastError::InvalidParameter(
                "Residual histogram needs at least one bin".to_string(),
            ));
        }
        Ok(())
    }

    /// Rows of history consumed before the first complete feature row
    pub fn warmup_rows(&self) -> usize {
        let max_lag = self.lags.iter().copied().max().unwrap_or(0);
        let max_window = self
            .windows
            .iter()
            .map(|w| w.saturating_sub(1))
            .max()
            .unwrap_or(0);
        max_lag.max(max_window)
    }
}
