//! # Charge Cast
//!
//! Exploratory analysis and linear forecasting for electric-vehicle charging
//! volume time series.
//!
//! ## Features
//!
//! - Loading per-zone charging readings from CSV into a polars frame
//! - Total volume, calendar, lag and rolling feature engineering
//! - Peak hour/day rankings and summary statistics
//! - Ordinary least squares regression with evaluation metrics
//! - Iterative multi-step forecasting that feeds predictions back as lags
//! - Plotly-like chart specifications, optionally rendered to SVG (`render` feature)
//!
//! ## Quick Start
//!
//! ```no_run
//! use charge_cast::{prepare_features, DataLoader, LinearRegression, PipelineConfig};
//! use charge_cast::{evaluate, forecast_from_table};
//!
//! # fn main() -> charge_cast::Result<()> {
//! let config = PipelineConfig::default();
//! let readings = DataLoader::from_csv("charging.csv")?;
//! let features = prepare_features(&readings, &config)?;
//! let (train, test) = features.split(config.train_ratio)?;
//!
//! let mut model = LinearRegression::new();
//! model.train(&train)?;
//!
//! let metrics = evaluate(&test.target()?, &model.predict_table(&test)?)?;
//! println!("{}", metrics);
//!
//! let forecast = forecast_from_table(&model, &features, config.forecast_steps)?;
//! println!("next hour: {:?}", forecast.values.first());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod metrics;
pub mod models;
#[cfg(feature = "render")]
pub mod render;
pub mod utils;
pub mod visualization;

// Re-export commonly used types
pub use crate::analysis::{peak_days, peak_hours, summary_stats, SummaryStats};
pub use crate::config::{PipelineConfig, TOTAL_VOLUME};
pub use crate::data::{DataLoader, ReadingTable};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{
    add_lag_features, add_rolling_features, add_time_features, feature_columns,
    prepare_features, split_data, total_volume, FeatureTable,
};
pub use crate::forecast::{forecast_from_table, forecast_future, ForecastOutput, ForecastState};
pub use crate::metrics::{evaluate, feature_importance, EvaluationMetrics};
pub use crate::models::{LinearRegression, Regressor};
pub use crate::visualization::{Chart, ChartKind};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
