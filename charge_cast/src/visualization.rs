//! Chart specifications for charging volume data products
//!
//! Each builder maps one data product to a [`Chart`]: a serializable,
//! plotly-like description with a title, axis titles and traces. Nothing is
//! written to disk here; see [`Chart::to_json`] and the `render` feature.

use crate::analysis::{volume_by, volume_by_day_and_hour, MONTH_NAMES, SHORT_DAY_NAMES};
use crate::config::TOTAL_VOLUME;
use crate::data::ReadingTable;
use crate::error::{ForecastError, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;

/// Layout template every chart uses
pub const TEMPLATE: &str = "plotly_white";

/// Unit label used on volume axes
const VOLUME_AXIS: &str = "Charging Volume (kWh)";
const AVG_VOLUME_AXIS: &str = "Avg Volume (kWh)";

/// How the traces of a chart are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    HorizontalBar,
    Histogram,
    Heatmap,
}

/// Values along one axis of a trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum AxisValues {
    Time(Vec<NaiveDateTime>),
    Category(Vec<String>),
    Number(Vec<f64>),
}

impl AxisValues {
    pub fn len(&self) -> usize {
        match self {
            AxisValues::Time(v) => v.len(),
            AxisValues::Category(v) => v.len(),
            AxisValues::Number(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One named series
///
/// Histogram traces carry the raw samples in `x` and leave `y` empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub x: AxisValues,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub dashed: bool,
}

impl Trace {
    fn new(name: &str, x: AxisValues, y: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            x,
            y,
            color: None,
            dashed: false,
        }
    }

    fn colored(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// Cell grid of a heatmap; `z[row][col]` is `None` where no data fell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapGrid {
    pub x_labels: Vec<u32>,
    pub y_labels: Vec<String>,
    pub z: Vec<Vec<Option<f64>>>,
    pub color_title: String,
    pub color_scale: String,
}

/// A complete chart specification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub traces: Vec<Trace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heatmap: Option<HeatmapGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
    pub template: String,
}

impl Chart {
    fn new(kind: ChartKind, title: &str, x_title: &str, y_title: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            x_title: x_title.to_string(),
            y_title: y_title.to_string(),
            traces: Vec::new(),
            heatmap: None,
            bins: None,
            template: TEMPLATE.to_string(),
        }
    }

    fn with_trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    /// Pretty-printed JSON form of the chart
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn check_lengths(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(ForecastError::DimensionMismatch { expected, got });
    }
    Ok(())
}

/// Total volume over time as a line
pub fn time_series_chart(table: &ReadingTable, title: Option<&str>) -> Result<Chart> {
    let timestamps = table.timestamps()?;
    let volume = table.column_values(TOTAL_VOLUME)?;

    Ok(Chart::new(
        ChartKind::Line,
        title.unwrap_or("EV Charging Volume Over Time"),
        "Time",
        VOLUME_AXIS,
    )
    .with_trace(Trace::new(TOTAL_VOLUME, AxisValues::Time(timestamps), volume)))
}

/// Mean volume per hour of day as bars
pub fn hourly_pattern_chart(table: &ReadingTable) -> Result<Chart> {
    let (hours, avg): (Vec<f64>, Vec<f64>) = volume_by(table, "hour")?
        .into_iter()
        .map(|(hour, v)| (hour as f64, v))
        .unzip();

    Ok(Chart::new(
        ChartKind::Bar,
        "Average Charging Volume by Hour",
        "Hour of Day",
        AVG_VOLUME_AXIS,
    )
    .with_trace(Trace::new(TOTAL_VOLUME, AxisValues::Number(hours), avg)))
}

/// Mean volume per day of week as bars labelled Mon..Sun
pub fn daily_pattern_chart(table: &ReadingTable) -> Result<Chart> {
    let (days, avg): (Vec<String>, Vec<f64>) = volume_by(table, "day_of_week")?
        .into_iter()
        .map(|(day, v)| (SHORT_DAY_NAMES[(day % 7) as usize].to_string(), v))
        .unzip();

    Ok(Chart::new(
        ChartKind::Bar,
        "Average Charging Volume by Day of Week",
        "Day of Week",
        AVG_VOLUME_AXIS,
    )
    .with_trace(Trace::new(TOTAL_VOLUME, AxisValues::Category(days), avg)))
}

/// Mean volume per calendar month as bars labelled Jan..Dec
pub fn monthly_pattern_chart(table: &ReadingTable) -> Result<Chart> {
    let mut months = Vec::new();
    let mut avg = Vec::new();
    for (month, v) in volume_by(table, "month")? {
        let name = (month as usize)
            .checked_sub(1)
            .and_then(|i| MONTH_NAMES.get(i))
            .ok_or_else(|| ForecastError::InputError(format!("Invalid month {}", month)))?;
        months.push(name.to_string());
        avg.push(v);
    }

    Ok(Chart::new(
        ChartKind::Bar,
        "Average Charging Volume by Month",
        "Month",
        AVG_VOLUME_AXIS,
    )
    .with_trace(Trace::new(TOTAL_VOLUME, AxisValues::Category(months), avg)))
}

/// Mean volume per (day, hour) cell over the days and hours present
pub fn heatmap_chart(table: &ReadingTable) -> Result<Chart> {
    let cells = volume_by_day_and_hour(table)?;
    let days: BTreeSet<u32> = cells.keys().map(|(day, _)| *day).collect();
    let hours: BTreeSet<u32> = cells.keys().map(|(_, hour)| *hour).collect();

    let z = days
        .iter()
        .map(|day| {
            hours
                .iter()
                .map(|hour| cells.get(&(*day, *hour)).copied())
                .collect()
        })
        .collect();

    let mut chart = Chart::new(
        ChartKind::Heatmap,
        "Charging Volume Heatmap (Day vs Hour)",
        "Hour",
        "Day",
    );
    chart.heatmap = Some(HeatmapGrid {
        x_labels: hours.into_iter().collect(),
        y_labels: days
            .iter()
            .map(|day| SHORT_DAY_NAMES[(day % 7) as usize].to_string())
            .collect(),
        z,
        color_title: "Volume (kWh)".to_string(),
        color_scale: "Blues".to_string(),
    });
    Ok(chart)
}

/// Actual (blue) and predicted (red) lines over shared dates
pub fn predictions_chart(
    actual: &[f64],
    predicted: &[f64],
    dates: &[NaiveDateTime],
    title: Option<&str>,
) -> Result<Chart> {
    check_lengths(actual.len(), predicted.len())?;
    check_lengths(actual.len(), dates.len())?;

    Ok(Chart::new(
        ChartKind::Line,
        title.unwrap_or("Actual vs Predicted"),
        "Time",
        VOLUME_AXIS,
    )
    .with_trace(
        Trace::new("Actual", AxisValues::Time(dates.to_vec()), actual.to_vec()).colored("blue"),
    )
    .with_trace(
        Trace::new("Predicted", AxisValues::Time(dates.to_vec()), predicted.to_vec())
            .colored("red"),
    ))
}

/// Historical line (blue) followed by a dashed forecast line (red)
pub fn forecast_chart(
    historical_dates: &[NaiveDateTime],
    historical_values: &[f64],
    forecast_dates: &[NaiveDateTime],
    forecast_values: &[f64],
) -> Result<Chart> {
    check_lengths(historical_dates.len(), historical_values.len())?;
    check_lengths(forecast_dates.len(), forecast_values.len())?;

    Ok(
        Chart::new(ChartKind::Line, "Demand Forecast", "Time", VOLUME_AXIS)
            .with_trace(
                Trace::new(
                    "Historical",
                    AxisValues::Time(historical_dates.to_vec()),
                    historical_values.to_vec(),
                )
                .colored("blue"),
            )
            .with_trace(
                Trace::new(
                    "Forecast",
                    AxisValues::Time(forecast_dates.to_vec()),
                    forecast_values.to_vec(),
                )
                .colored("red")
                .dashed(),
            ),
    )
}

/// Horizontal bars for the first `top_n` entries of a ranked importance list
pub fn feature_importance_chart(importance: &[(String, f64)], top_n: usize) -> Chart {
    let (names, values): (Vec<String>, Vec<f64>) = importance.iter().take(top_n).cloned().unzip();

    Chart::new(
        ChartKind::HorizontalBar,
        &format!("Top {} Feature Importance", top_n),
        "Importance",
        "Feature",
    )
    .with_trace(Trace::new("importance", AxisValues::Category(names), values))
}

/// Histogram of `actual - predicted`
pub fn residuals_chart(actual: &[f64], predicted: &[f64], bins: usize) -> Result<Chart> {
    check_lengths(actual.len(), predicted.len())?;
    if bins == 0 {
        return Err(ForecastError::InvalidParameter(
            "Histogram needs at least one bin".to_string(),
        ));
    }

    let residuals = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
    let mut chart = Chart::new(
        ChartKind::Histogram,
        "Prediction Residuals Distribution",
        "Residual",
        "Frequency",
    )
    .with_trace(Trace::new("residual", AxisValues::Number(residuals), Vec::new()));
    chart.bins = Some(bins);
    Ok(chart)
}

/// Equal-width bins over the sample range as `(lower, upper, count)`
///
/// The last bin is closed on the right. A constant sample lands in one unit-wide bin.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        return vec![(min - 0.5, min + 0.5, values.len())];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in values {
        let bin = ((value - min) / width).floor() as usize;
        counts[bin.min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = min + i as f64 * width;
            (lower, lower + width, count)
        })
        .collect()
}
