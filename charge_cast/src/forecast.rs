//! Iterative multi-step forecasting
//!
//! Each step predicts one hour ahead from a [`ForecastState`], then builds the
//! next state from that prediction. Predictions, not observations, feed the
//! lag chain, so errors compound over the horizon.

use crate::error::{ForecastError, Result};
use crate::features::{is_weekend, FeatureTable};
use crate::models::Regressor;
use crate::utils::future_timestamps;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use volume_math::cyclical::{DAYS_PER_WEEK, HOURS_PER_DAY};
use volume_math::{day_of_week_encoding, hour_encoding};

/// Snapshot of the model inputs at one forecast step
///
/// Calendar encodings and the weekend flag are derived from `hour` and
/// `day_of_week` on read. Lags outside the contiguous chain starting at
/// `lag_1`, rolling statistics, day and month are carried unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastState {
    pub hour: u32,
    pub day_of_week: u32,
    pub lags: BTreeMap<usize, f64>,
    pub held: BTreeMap<String, f64>,
}

fn parse_lag(name: &str) -> Option<usize> {
    name.strip_prefix("lag_")?.parse().ok()
}

fn calendar_field(row: &BTreeMap<String, f64>, name: &str, period: u32) -> Result<u32> {
    let value = *row
        .get(name)
        .ok_or_else(|| ForecastError::InputError(format!("Forecast row has no '{}'", name)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ForecastError::InputError(format!(
            "Forecast row has invalid '{}' value {}",
            name, value
        )));
    }
    Ok(value as u32 % period)
}

impl ForecastState {
    /// Build the starting state from a feature row
    pub fn from_row(row: &BTreeMap<String, f64>) -> Result<Self> {
        let hour = calendar_field(row, "hour", HOURS_PER_DAY)?;
        let day_of_week = calendar_field(row, "day_of_week", DAYS_PER_WEEK)?;

        let mut lags = BTreeMap::new();
        let mut held = BTreeMap::new();
        for (name, &value) in row {
            match (parse_lag(name), name.as_str()) {
                (Some(lag), _) => {
                    lags.insert(lag, value);
                }
                (None, "hour" | "day_of_week" | "is_weekend")
                | (None, "hour_sin" | "hour_cos" | "day_sin" | "day_cos") => {}
                (None, _) => {
                    held.insert(name.clone(), value);
                }
            }
        }

        Ok(Self {
            hour,
            day_of_week,
            lags,
            held,
        })
    }

    /// Current value of a named feature
    pub fn value(&self, name: &str) -> Option<f64> {
        match name {
            "hour" => Some(self.hour as f64),
            "day_of_week" => Some(self.day_of_week as f64),
            "is_weekend" => Some(if is_weekend(self.day_of_week) { 1.0 } else { 0.0 }),
            "hour_sin" => Some(hour_encoding(self.hour).sin),
            "hour_cos" => Some(hour_encoding(self.hour).cos),
            "day_sin" => Some(day_of_week_encoding(self.day_of_week).sin),
            "day_cos" => Some(day_of_week_encoding(self.day_of_week).cos),
            _ => match parse_lag(name) {
                Some(lag) => self.lags.get(&lag).copied(),
                None => self.held.get(name).copied(),
            },
        }
    }

    /// Model input row in `feature_cols` order
    pub fn feature_vector(&self, feature_cols: &[String]) -> Result<Vec<f64>> {
        feature_cols
            .iter()
            .map(|name| {
                self.value(name).ok_or_else(|| {
                    ForecastError::InputError(format!("Forecast state has no feature '{}'", name))
                })
            })
            .collect()
    }

    /// The state one hour later, with `prediction` as the newest lag
    pub fn advance(&self, prediction: f64) -> Self {
        let mut lags = self.lags.clone();

        let chain_len = (1..).take_while(|k| self.lags.contains_key(k)).count();
        for k in (2..=chain_len).rev() {
            lags.insert(k, self.lags[&(k - 1)]);
        }
        if chain_len > 0 {
            lags.insert(1, prediction);
        }

        let hour = (self.hour + 1) % HOURS_PER_DAY;
        let day_of_week = if hour == 0 {
            (self.day_of_week + 1) % DAYS_PER_WEEK
        } else {
            self.day_of_week
        };

        Self {
            hour,
            day_of_week,
            lags,
            held: self.held.clone(),
        }
    }
}

/// Predict `steps` values ahead, feeding each prediction into the next step
pub fn forecast_future<R: Regressor + ?Sized>(
    model: &R,
    start: &ForecastState,
    feature_cols: &[String],
    steps: usize,
) -> Result<Vec<f64>> {
    let mut predictions = Vec::with_capacity(steps);
    let mut state = start.clone();

    for _ in 0..steps {
        let x = state.feature_vector(feature_cols)?;
        let prediction = model.predict_one(&x)?;
        predictions.push(prediction);
        state = state.advance(prediction);
    }

    Ok(predictions)
}

/// Forecast values paired with the hourly timestamps they belong to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutput {
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

impl ForecastOutput {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Forecast `steps` hours past the last row of a feature table
pub fn forecast_from_table<R: Regressor + ?Sized>(
    model: &R,
    table: &FeatureTable,
    steps: usize,
) -> Result<ForecastOutput> {
    let start = ForecastState::from_row(&table.last_row()?)?;
    let last = table
        .table()
        .timestamps()?
        .last()
        .copied()
        .ok_or(ForecastError::InsufficientData { needed: 1, got: 0 })?;

    let values = forecast_future(model, &start, table.feature_columns(), steps)?;
    info!(steps, from = %last, "forecast complete");

    Ok(ForecastOutput {
        timestamps: future_timestamps(last, steps, Duration::hours(1)),
        values,
    })
}
