//! Trailing window statistics
//!
//! The window includes the current observation, so the first value is
//! available once `period` observations have been seen:
//! - Rolling mean
//! - Rolling sample standard deviation (n - 1 denominator)

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Fixed-size trailing window over a stream of observations
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl RollingWindow {
    /// Create a new rolling window with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
        })
    }

    /// Push a new observation, evicting the oldest once the window is full
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }
    }

    /// Whether `period` observations have been seen
    pub fn is_full(&self) -> bool {
        self.values.len() == self.period
    }

    /// Mean of the window
    pub fn mean(&self) -> Result<f64> {
        if !self.is_full() {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for rolling mean. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        Ok(self.sum / self.period as f64)
    }

    /// Sample standard deviation of the window
    pub fn std_dev(&self) -> Result<f64> {
        if !self.is_full() {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for rolling standard deviation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }
        if self.period < 2 {
            return Err(MathError::InsufficientData(
                "Sample standard deviation needs a window of at least 2".to_string(),
            ));
        }

        let mean = self.values.iter().sum::<f64>() / self.period as f64;
        let variance = self
            .values
            .iter()
            .map(|&v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (self.period - 1) as f64;

        Ok(variance.sqrt())
    }
}

/// Trailing mean over `period` observations, `None` until the window fills
pub fn rolling_mean(values: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut window = RollingWindow::new(period)?;
    Ok(values
        .iter()
        .map(|&v| {
            window.update(v);
            window.mean().ok()
        })
        .collect())
}

/// Trailing sample standard deviation over `period` observations, `None`
/// until the window fills
pub fn rolling_std(values: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut window = RollingWindow::new(period)?;
    Ok(values
        .iter()
        .map(|&v| {
            window.update(v);
            window.std_dev().ok()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_window_mean() {
        let mut window = RollingWindow::new(3).unwrap();

        // Not enough data yet
        assert!(window.mean().is_err());

        window.update(2.0);
        window.update(4.0);
        assert!(window.mean().is_err());

        window.update(6.0);
        assert_eq!(window.mean().unwrap(), 4.0);

        // The window slides, dropping the oldest value
        window.update(8.0);
        assert_eq!(window.mean().unwrap(), 6.0);
    }

    #[test]
    fn test_window_std_dev_is_sample_std() {
        let mut window = RollingWindow::new(4).unwrap();
        for v in [2.0, 4.0, 4.0, 6.0] {
            window.update(v);
        }
        // mean 4, squared deviations 4 + 0 + 0 + 4 = 8, 8 / 3
        assert_relative_eq!(window.std_dev().unwrap(), (8.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(RollingWindow::new(0).is_err());
        assert!(rolling_mean(&[1.0], 0).is_err());
    }

    #[test]
    fn test_rolling_mean_leading_nones() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(out, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn test_rolling_std_constant_series() {
        let out = rolling_std(&[5.0; 5], 3).unwrap();
        assert_eq!(out[..2], [None, None]);
        for v in &out[2..] {
            assert_eq!(*v, Some(0.0));
        }
    }

    #[test]
    fn test_window_longer_than_series() {
        let out = rolling_std(&[1.0, 2.0], 6).unwrap();
        assert!(out.iter().all(Option::is_none));
    }
}
