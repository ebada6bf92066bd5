//! Feature engineering for charging volume forecasting
//!
//! Each step returns a new table with extra columns; undefined values
//! (insufficient history) are polars nulls until [`prepare_features`]
//! drops the affected rows.

use crate::config::{PipelineConfig, TOTAL_VOLUME};
use crate::data::ReadingTable;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Timelike};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;
use volume_math::{day_of_week_encoding, hour_encoding, rolling_mean, rolling_std};

/// Calendar-derived model inputs, in model column order
pub const CALENDAR_COLUMNS: [&str; 9] = [
    "hour",
    "day_of_week",
    "day",
    "month",
    "is_weekend",
    "hour_sin",
    "hour_cos",
    "day_sin",
    "day_cos",
];

/// Name of the lag column for offset `lag`
pub fn lag_column(lag: usize) -> String {
    format!("lag_{}", lag)
}

/// Name of the rolling mean column for `window`
pub fn rolling_mean_column(window: usize) -> String {
    format!("rolling_mean_{}", window)
}

/// Name of the rolling standard deviation column for `window`
pub fn rolling_std_column(window: usize) -> String {
    format!("rolling_std_{}", window)
}

/// Weekend flag for a Monday-based day of week
pub fn is_weekend(day_of_week: u32) -> bool {
    day_of_week >= 5
}

/// Model input columns: calendar fields, lags, rolling means, rolling stds
pub fn feature_columns(config: &PipelineConfig) -> Vec<String> {
    CALENDAR_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(config.lags.iter().map(|&lag| lag_column(lag)))
        .chain(config.windows.iter().map(|&w| rolling_mean_column(w)))
        .chain(config.windows.iter().map(|&w| rolling_std_column(w)))
        .collect()
}

/// Add `total_volume`: the row-wise sum of every zone column, nulls counting as zero
pub fn total_volume(table: &ReadingTable) -> Result<ReadingTable> {
    let mut totals = vec![0.0; table.len()];
    for zone in table.zones() {
        for (total, value) in totals.iter_mut().zip(table.column_f64(zone)?) {
            *total += value.unwrap_or(0.0);
        }
    }

    table.with_column(Series::new(TOTAL_VOLUME, totals))
}

/// Add hour, day of week, day, month, weekend flag and cyclical encodings
pub fn add_time_features(table: &ReadingTable) -> Result<ReadingTable> {
    let timestamps = table.timestamps()?;
    let n = timestamps.len();

    let mut hours = Vec::with_capacity(n);
    let mut days_of_week = Vec::with_capacity(n);
    let mut days = Vec::with_capacity(n);
    let mut months = Vec::with_capacity(n);
    let mut weekend = Vec::with_capacity(n);
    let mut hour_sin = Vec::with_capacity(n);
    let mut hour_cos = Vec::with_capacity(n);
    let mut day_sin = Vec::with_capacity(n);
    let mut day_cos = Vec::with_capacity(n);

    for ts in &timestamps {
        let hour = ts.hour();
        let dow = ts.weekday().num_days_from_monday();
        let he = hour_encoding(hour);
        let de = day_of_week_encoding(dow);

        hours.push(hour as i32);
        days_of_week.push(dow as i32);
        days.push(ts.day() as i32);
        months.push(ts.month() as i32);
        weekend.push(is_weekend(dow) as i32);
        hour_sin.push(he.sin);
        hour_cos.push(he.cos);
        day_sin.push(de.sin);
        day_cos.push(de.cos);
    }

    let mut df = table.dataframe().clone();
    for series in [
        Series::new("hour", hours),
        Series::new("day_of_week", days_of_week),
        Series::new("day", days),
        Series::new("month", months),
        Series::new("is_weekend", weekend),
        Series::new("hour_sin", hour_sin),
        Series::new("hour_cos", hour_cos),
        Series::new("day_sin", day_sin),
        Series::new("day_cos", day_cos),
    ] {
        df.with_column(series)?;
    }

    Ok(table.replace_dataframe(df))
}

/// Add `lag_k` columns: row i holds the target of row i - k, null for i < k
pub fn add_lag_features(table: &ReadingTable, target: &str, lags: &[usize]) -> Result<ReadingTable> {
    let values = table.column_f64(target)?;
    let mut df = table.dataframe().clone();

    for &lag in lags {
        let shifted: Vec<Option<f64>> = (0..values.len())
            .map(|i| if i >= lag { values[i - lag] } else { None })
            .collect();
        df.with_column(Series::new(&lag_column(lag), shifted))?;
    }

    Ok(table.replace_dataframe(df))
}

/// Add trailing `rolling_mean_w` and `rolling_std_w` columns, null until the window fills
pub fn add_rolling_features(
    table: &ReadingTable,
    target: &str,
    windows: &[usize],
) -> Result<ReadingTable> {
    let raw = table.column_f64(target)?;
    let mut df = table.dataframe().clone();

    for &window in windows {
        let (means, stds) = rolling_with_gaps(&raw, window)?;
        df.with_column(Series::new(&rolling_mean_column(window), means))?;
        df.with_column(Series::new(&rolling_std_column(window), stds))?;
    }

    Ok(table.replace_dataframe(df))
}

/// Rolling statistics where any null inside a window makes that window null
fn rolling_with_gaps(
    raw: &[Option<f64>],
    window: usize,
) -> Result<(Vec<Option<f64>>, Vec<Option<f64>>)> {
    let filled: Vec<f64> = raw.iter().map(|v| v.unwrap_or(0.0)).collect();
    let mut means = rolling_mean(&filled, window)?;
    let mut stds = rolling_std(&filled, window)?;

    let mut last_gap: Option<usize> = None;
    for (i, value) in raw.iter().enumerate() {
        if value.is_none() {
            last_gap = Some(i);
        }
        if matches!(last_gap, Some(gap) if i - gap < window) {
            means[i] = None;
            stds[i] = None;
        }
    }

    Ok((means, stds))
}

/// A fully defined feature table ready for model fitting
#[derive(Debug, Clone)]
pub struct FeatureTable {
    table: ReadingTable,
    feature_columns: Vec<String>,
    target_column: String,
}

impl FeatureTable {
    /// Underlying table, including zone and time columns
    pub fn table(&self) -> &ReadingTable {
        &self.table
    }

    /// Names of the model input columns
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Name of the target column
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if every row was dropped
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Row-major design matrix over the given columns
    pub fn design_matrix(&self, columns: &[String]) -> Result<Vec<Vec<f64>>> {
        let cols = columns
            .iter()
            .map(|name| self.table.column_values(name))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..self.len())
            .map(|row| cols.iter().map(|col| col[row]).collect())
            .collect())
    }

    /// Target values
    pub fn target(&self) -> Result<Vec<f64>> {
        self.table.column_values(&self.target_column)
    }

    /// All numeric columns of one row, keyed by name
    pub fn row(&self, index: usize) -> Result<BTreeMap<String, f64>> {
        if index >= self.len() {
            return Err(ForecastError::InsufficientData {
                needed: index + 1,
                got: self.len(),
            });
        }

        let single = self.table.slice(index, Some(index + 1));
        let mut row = BTreeMap::new();
        for name in single.dataframe().get_column_names() {
            if let Some(Some(value)) = single.column_f64(name)?.first() {
                row.insert(name.to_string(), *value);
            }
        }
        Ok(row)
    }

    /// The most recent row, the starting point for forecasting
    pub fn last_row(&self) -> Result<BTreeMap<String, f64>> {
        if self.is_empty() {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }
        self.row(self.len() - 1)
    }

    /// Ordered prefix/suffix split; the prefix holds `floor(len * ratio)` rows
    pub fn split(&self, train_ratio: f64) -> Result<(FeatureTable, FeatureTable)> {
        if !(0.0..=1.0).contains(&train_ratio) {
            return Err(ForecastError::InvalidParameter(format!(
                "Train ratio must be in [0, 1], got {}",
                train_ratio
            )));
        }

        let train_size = (self.len() as f64 * train_ratio).floor() as usize;
        let part = |table: ReadingTable| FeatureTable {
            table,
            feature_columns: self.feature_columns.clone(),
            target_column: self.target_column.clone(),
        };

        Ok((
            part(self.table.slice(0, Some(train_size))),
            part(self.table.slice(train_size, None)),
        ))
    }
}

/// Compose total volume, calendar, lag and rolling features, then drop
/// every row holding an undefined value
pub fn prepare_features(table: &ReadingTable, config: &PipelineConfig) -> Result<FeatureTable> {
    config.validate()?;
    let target = config.target_column.as_str();

    let prepared = total_volume(table)?;
    let prepared = add_time_features(&prepared)?;
    if !prepared.has_column(target) {
        return Err(ForecastError::InputError(format!(
            "Target column '{}' not found",
            target
        )));
    }
    let prepared = add_lag_features(&prepared, target, &config.lags)?;
    let prepared = add_rolling_features(&prepared, target, &config.windows)?;

    let before = prepared.len();
    let prepared = prepared.drop_nulls()?;
    debug!(
        rows_in = before,
        rows_out = prepared.len(),
        "dropped rows with undefined features"
    );

    Ok(FeatureTable {
        table: prepared,
        feature_columns: feature_columns(config),
        target_column: target.to_string(),
    })
}

/// Ordered train/test split of a feature table
pub fn split_data(table: &FeatureTable, train_ratio: f64) -> Result<(FeatureTable, FeatureTable)> {
    table.split(train_ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn hours_from(start: NaiveDateTime, n: usize) -> Vec<NaiveDateTime> {
        (0..n).map(|h| start + Duration::hours(h as i64)).collect()
    }

    fn monday() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn table(zones: Vec<(&str, Vec<f64>)>) -> ReadingTable {
        let n = zones[0].1.len();
        ReadingTable::new(
            &hours_from(monday(), n),
            zones
                .into_iter()
                .map(|(name, values)| (name.to_string(), values))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_total_volume_two_zones() {
        let readings = table(vec![("A", vec![2.0, 1.0]), ("B", vec![1.0, 1.0])]);
        let with_total = total_volume(&readings).unwrap();
        assert_eq!(
            with_total.column_values(TOTAL_VOLUME).unwrap(),
            vec![3.0, 2.0]
        );

        let lagged = add_lag_features(&with_total, TOTAL_VOLUME, &[1]).unwrap();
        assert_eq!(lagged.column_f64("lag_1").unwrap(), vec![None, Some(3.0)]);
    }

    #[test]
    fn test_total_volume_ignores_column_order() {
        let forward = table(vec![("A", vec![1.5, 2.0]), ("B", vec![4.0, 0.5])]);
        let reversed = table(vec![("B", vec![4.0, 0.5]), ("A", vec![1.5, 2.0])]);
        assert_eq!(
            total_volume(&forward).unwrap().column_values(TOTAL_VOLUME).unwrap(),
            total_volume(&reversed).unwrap().column_values(TOTAL_VOLUME).unwrap()
        );
    }

    #[test]
    fn test_total_volume_replaces_existing_total() {
        let readings = table(vec![("A", vec![1.0, 2.0])]);
        let once = total_volume(&readings).unwrap();
        let twice = total_volume(&once).unwrap();
        assert_eq!(twice.column_values(TOTAL_VOLUME).unwrap(), vec![1.0, 2.0]);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(6)]
    fn test_lag_shifts_target(#[case] lag: usize) {
        let values: Vec<f64> = (0..10).map(|v| v as f64 * 10.0).collect();
        let readings = total_volume(&table(vec![("A", values.clone())])).unwrap();
        let lagged = add_lag_features(&readings, TOTAL_VOLUME, &[lag]).unwrap();
        let column = lagged.column_f64(&lag_column(lag)).unwrap();

        for (i, v) in column.iter().enumerate() {
            if i < lag {
                assert_eq!(*v, None);
            } else {
                assert_eq!(*v, Some(values[i - lag]));
            }
        }
    }

    #[test]
    fn test_rolling_features_fill_after_window() {
        let readings = total_volume(&table(vec![("A", vec![1.0, 2.0, 3.0, 4.0])])).unwrap();
        let rolled = add_rolling_features(&readings, TOTAL_VOLUME, &[3]).unwrap();

        let means = rolled.column_f64("rolling_mean_3").unwrap();
        assert_eq!(means, vec![None, None, Some(2.0), Some(3.0)]);

        let stds = rolled.column_f64("rolling_std_3").unwrap();
        assert_eq!(stds[..2], [None, None]);
        assert_abs_diff_eq!(stds[2].unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_window_with_gap_is_null() {
        let (means, _) = rolling_with_gaps(&[Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)], 2)
            .unwrap();
        assert_eq!(means, vec![None, None, None, Some(3.5), Some(4.5)]);
    }

    #[test]
    fn test_time_features() {
        // 2024-01-06 is a Saturday
        let saturday_noon = NaiveDate::from_ymd_opt(2024, 1, 6)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let readings = ReadingTable::new(
            &[saturday_noon],
            vec![("A".to_string(), vec![1.0])],
        )
        .unwrap();
        let featured = add_time_features(&readings).unwrap();

        assert_eq!(featured.column_values("hour").unwrap(), vec![12.0]);
        assert_eq!(featured.column_values("day_of_week").unwrap(), vec![5.0]);
        assert_eq!(featured.column_values("day").unwrap(), vec![6.0]);
        assert_eq!(featured.column_values("month").unwrap(), vec![1.0]);
        assert_eq!(featured.column_values("is_weekend").unwrap(), vec![1.0]);
        assert_abs_diff_eq!(featured.column_values("hour_cos").unwrap()[0], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_prepare_features_drops_warmup_rows() {
        let values: Vec<f64> = (0..60).map(|v| (v % 24) as f64 + 1.0).collect();
        let readings = table(vec![("A", values)]);
        let config = PipelineConfig::default();

        let features = prepare_features(&readings, &config).unwrap();
        assert_eq!(features.len(), 60 - config.warmup_rows());
        assert_eq!(features.feature_columns().len(), 21);

        let matrix = features.design_matrix(features.feature_columns()).unwrap();
        assert_eq!(matrix.len(), features.len());
        assert!(matrix.iter().all(|row| row.len() == 21));

        // First surviving row is row 24: lag_24 points at row 0
        let first = features.row(0).unwrap();
        assert_eq!(first["lag_24"], 1.0);
        assert_eq!(first["lag_1"], 24.0);
    }

    #[test]
    fn test_prepare_features_short_input_is_empty() {
        let readings = table(vec![("A", vec![1.0; 10])]);
        let features = prepare_features(&readings, &PipelineConfig::default()).unwrap();
        assert!(features.is_empty());
        assert!(features.last_row().is_err());
    }

    #[test]
    fn test_prepare_features_empty_input() {
        let readings = ReadingTable::new(&[], vec![("A".to_string(), vec![])]).unwrap();
        let features = prepare_features(&readings, &PipelineConfig::default()).unwrap();
        assert!(features.is_empty());
        assert!(features.target().unwrap().is_empty());
    }

    #[rstest]
    #[case(10, 0.8, 8)]
    #[case(7, 0.5, 3)]
    #[case(5, 0.0, 0)]
    #[case(5, 1.0, 5)]
    #[case(0, 0.8, 0)]
    fn test_split_sizes(#[case] rows: usize, #[case] ratio: f64, #[case] expected: usize) {
        let values: Vec<f64> = (0..rows + 24).map(|v| v as f64).collect();
        let config = PipelineConfig::default();
        let features = prepare_features(&table(vec![("A", values)]), &config).unwrap();
        assert_eq!(features.len(), rows);

        let (train, test) = split_data(&features, ratio).unwrap();
        assert_eq!(train.len(), expected);
        assert_eq!(train.len() + test.len(), rows);

        let mut joined = train.target().unwrap();
        joined.extend(test.target().unwrap());
        assert_eq!(joined, features.target().unwrap());
    }

    #[test]
    fn test_split_rejects_bad_ratio() {
        let features = prepare_features(
            &table(vec![("A", vec![1.0; 30])]),
            &PipelineConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            split_data(&features, 1.2),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_feature_column_order() {
        let config = PipelineConfig {
            lags: vec![1, 2],
            windows: vec![3],
            ..PipelineConfig::default()
        };
        let columns = feature_columns(&config);
        assert_eq!(
            columns[9..],
            ["lag_1", "lag_2", "rolling_mean_3", "rolling_std_3"]
        );
    }
}
