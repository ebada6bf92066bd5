//! # Charge Cast Workspace
//!
//! `charge_cast_workspace` bundles the crates of the charging volume toolkit:
//!
//! - [`math`]: rolling statistics, cyclical encodings and least squares (`volume_math`)
//! - [`cast`]: loading, feature engineering, the linear forecaster and charts (`charge_cast`)
//!
//! ## Example
//!
//! ```
//! use charge_cast_workspace::math::hour_encoding;
//!
//! let six_am = hour_encoding(6);
//! assert!((six_am.sin - 1.0).abs() < 1e-12);
//! assert!(six_am.cos.abs() < 1e-12);
//! ```

pub use charge_cast as cast;
pub use volume_math as math;

/// The most used types of both crates
pub mod prelude {
    pub use charge_cast::{
        evaluate, feature_importance, forecast_from_table, prepare_features, DataLoader,
        FeatureTable, ForecastError, LinearRegression, PipelineConfig, ReadingTable, Regressor,
    };
    pub use volume_math::{least_squares, MathError, RollingWindow};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_facade_exposes_both_crates() {
        let config = PipelineConfig::default();
        assert_eq!(config.lags, vec![1, 2, 3, 6, 12, 24]);

        let fit = least_squares(&[vec![1.0], vec![2.0], vec![3.0]], &[2.0, 4.0, 6.0]).unwrap();
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-10);
        assert!(fit.intercept.abs() < 1e-10);
    }

    #[test]
    fn test_rolling_window_through_facade() {
        let mut window = RollingWindow::new(2).unwrap();
        window.update(1.0);
        window.update(3.0);
        assert_eq!(window.mean().unwrap(), 2.0);
    }
}
