//! Utility functions for the charge_cast crate

use crate::data::ReadingTable;
use crate::error::{ForecastError, Result};
use crate::forecast::ForecastOutput;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use std::f64::consts::PI;
use std::path::Path;

/// Round to a fixed number of decimal places, ties to the even neighbour
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// Timestamps following `last`, spaced by `step`
pub fn future_timestamps(last: NaiveDateTime, steps: usize, step: Duration) -> Vec<NaiveDateTime> {
    (1..=steps as i32).map(|i| last + step * i).collect()
}

/// Settings for synthetic charging readings
#[derive(Debug, Clone)]
pub struct SampleSettings {
    pub start: NaiveDateTime,
    pub hours: usize,
    pub zones: usize,
    /// Mean hourly volume of one zone
    pub base_volume: f64,
    /// Standard deviation of the additive noise
    pub noise: f64,
    pub seed: u64,
}

impl SampleSettings {
    pub fn new(start: NaiveDateTime, hours: usize) -> Self {
        Self {
            start,
            hours,
            zones: 3,
            base_volume: 20.0,
            noise: 2.0,
            seed: 42,
        }
    }
}

/// Commuter-shaped daily profile with morning and evening peaks
fn daily_profile(hour: u32) -> f64 {
    let bump = |center: f64, width: f64| (-((hour as f64 - center) / width).powi(2)).exp();
    0.4 + bump(8.0, 2.0) + 1.3 * bump(18.0, 2.5)
}

/// Generate hourly multi-zone readings with daily and weekly seasonality
///
/// Output is deterministic for a given seed. Values are clamped at zero.
pub fn generate_sample_readings(settings: &SampleSettings) -> Result<ReadingTable> {
    let noise = Normal::new(0.0, settings.noise)
        .map_err(|e| ForecastError::InvalidParameter(format!("Invalid noise level: {}", e)))?;
    let mut rng = StdRng::seed_from_u64(settings.seed);

    let timestamps: Vec<NaiveDateTime> = (0..settings.hours)
        .map(|h| settings.start + Duration::hours(h as i64))
        .collect();

    let zones = (0..settings.zones)
        .map(|zone| {
            let scale = settings.base_volume * (1.0 + 0.25 * zone as f64);
            let values = timestamps
                .iter()
                .enumerate()
                .map(|(i, ts)| {
                    let weekday = ts.weekday().num_days_from_monday();
                    let weekly = if weekday >= 5 { 0.7 } else { 1.0 };
                    // slow drift over a month
                    let drift = 1.0 + 0.05 * (2.0 * PI * i as f64 / (24.0 * 30.0)).sin();
                    let value = scale * daily_profile(ts.hour()) * weekly * drift
                        + noise.sample(&mut rng);
                    value.max(0.0)
                })
                .collect();
            (format!("zone_{}", zone + 1), values)
        })
        .collect();

    ReadingTable::new(&timestamps, zones)
}

#[derive(Serialize)]
struct ForecastRecord {
    time: String,
    forecast: f64,
}

/// Write a forecast as `time,forecast` rows
pub fn write_forecast_csv<P: AsRef<Path>>(path: P, forecast: &ForecastOutput) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (ts, value) in forecast.timestamps.iter().zip(&forecast.values) {
        writer.serialize(ForecastRecord {
            time: ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            forecast: *value,
        })?;
    }
    writer.flush()?;
    Ok(())
}
