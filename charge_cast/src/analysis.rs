//! Descriptive summaries of charging volume

use crate::config::TOTAL_VOLUME;
use crate::data::ReadingTable;
use crate::error::Result;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Full day names, Monday first
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Abbreviated day names, Monday first
pub const SHORT_DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Abbreviated month names, January first
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Mean of `values` per distinct key, keys ascending
pub fn group_mean(keys: &[u32], values: &[f64]) -> BTreeMap<u32, f64> {
    let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for (&key, &value) in keys.iter().zip(values) {
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}

/// Mean total volume per value of an integer calendar column
pub fn volume_by(table: &ReadingTable, key_column: &str) -> Result<BTreeMap<u32, f64>> {
    let keys: Vec<u32> = table
        .column_values(key_column)?
        .into_iter()
        .map(|k| k as u32)
        .collect();
    let volume = table.column_values(TOTAL_VOLUME)?;
    Ok(group_mean(&keys, &volume))
}

/// Mean total volume per (day of week, hour) cell
pub fn volume_by_day_and_hour(table: &ReadingTable) -> Result<BTreeMap<(u32, u32), f64>> {
    let days = table.column_values("day_of_week")?;
    let hours = table.column_values("hour")?;
    let volume = table.column_values(TOTAL_VOLUME)?;

    let mut sums: BTreeMap<(u32, u32), (f64, usize)> = BTreeMap::new();
    for ((day, hour), value) in days.iter().zip(&hours).zip(&volume) {
        let entry = sums.entry((*day as u32, *hour as u32)).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    Ok(sums
        .into_iter()
        .map(|(cell, (sum, count))| (cell, sum / count as f64))
        .collect())
}

/// The `top_n` largest groups, descending; ties keep ascending key order
fn top_n(groups: BTreeMap<u32, f64>, top_n: usize) -> Vec<(u32, f64)> {
    let mut ranked: Vec<(u32, f64)> = groups.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.truncate(top_n);
    ranked
}

/// Hours of day with the highest mean total volume
pub fn peak_hours(table: &ReadingTable, n: usize) -> Result<Vec<(u32, f64)>> {
    Ok(top_n(volume_by(table, "hour")?, n))
}

/// Days of week with the highest mean total volume, by name
pub fn peak_days(table: &ReadingTable, n: usize) -> Result<Vec<(String, f64)>> {
    Ok(top_n(volume_by(table, "day_of_week")?, n)
        .into_iter()
        .map(|(day, avg)| (day_name(day).to_string(), avg))
        .collect())
}

/// Full English name of a Monday-based day index
pub fn day_name(day_of_week: u32) -> &'static str {
    DAY_NAMES[(day_of_week % 7) as usize]
}

/// Headline statistics of a table's total volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_records: usize,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
    pub avg_volume: Option<f64>,
    pub max_volume: Option<f64>,
    pub min_volume: Option<f64>,
    /// Sample standard deviation; needs two records
    pub std_volume: Option<f64>,
}

/// Count, date range and mean/max/min/std of total volume
pub fn summary_stats(table: &ReadingTable) -> Result<SummaryStats> {
    let volume = table.column_values(TOTAL_VOLUME)?;
    let timestamps = table.timestamps()?;

    let date = |ts: Option<&chrono::NaiveDateTime>| ts.map(|t| t.format("%Y-%m-%d").to_string());
    let defined = |v: f64| if v.is_nan() { None } else { Some(v) };

    if volume.is_empty() {
        return Ok(SummaryStats {
            total_records: 0,
            date_range_start: None,
            date_range_end: None,
            avg_volume: None,
            max_volume: None,
            min_volume: None,
            std_volume: None,
        });
    }

    Ok(SummaryStats {
        total_records: volume.len(),
        date_range_start: date(timestamps.iter().min()),
        date_range_end: date(timestamps.iter().max()),
        avg_volume: defined(volume.iter().mean()),
        max_volume: defined(Statistics::max(volume.iter())),
        min_volume: defined(Statistics::min(volume.iter())),
        std_volume: defined(volume.iter().std_dev()),
    })
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.2}", v));
        writeln!(f, "Charging Volume Summary:")?;
        writeln!(f, "  Records:  {}", self.total_records)?;
        writeln!(
            f,
            "  Range:    {} .. {}",
            self.date_range_start.as_deref().unwrap_or("-"),
            self.date_range_end.as_deref().unwrap_or("-")
        )?;
        writeln!(f, "  Average:  {}", show(self.avg_volume))?;
        writeln!(f, "  Max:      {}", show(self.max_volume))?;
        writeln!(f, "  Min:      {}", show(self.min_volume))?;
        writeln!(f, "  Std Dev:  {}", show(self.std_volume))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{add_time_features, total_volume};
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;

    fn featured(values: Vec<f64>) -> ReadingTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let timestamps: Vec<_> = (0..values.len())
            .map(|h| start + Duration::hours(h as i64))
            .collect();
        let table = ReadingTable::new(&timestamps, vec![("zone".to_string(), values)]).unwrap();
        add_time_features(&total_volume(&table).unwrap()).unwrap()
    }

    #[test]
    fn test_group_mean() {
        let means = group_mean(&[1, 0, 1, 2], &[4.0, 1.0, 6.0, 3.0]);
        assert_eq!(means.into_iter().collect::<Vec<_>>(), vec![(0, 1.0), (1, 5.0), (2, 3.0)]);
    }

    #[test]
    fn test_peak_hours_order_and_ties() {
        // Two days of hourly data; volume equals the hour except hours 3 and 5 tie at 100
        let values: Vec<f64> = (0..48)
            .map(|i| match i % 24 {
                3 | 5 => 100.0,
                h => h as f64,
            })
            .collect();
        let table = featured(values);

        let peaks = peak_hours(&table, 4).unwrap();
        assert_eq!(peaks, vec![(3, 100.0), (5, 100.0), (23, 23.0), (22, 22.0)]);
    }

    #[test]
    fn test_peak_days_named() {
        // 2024-01-01 is a Monday; three full days with rising volume
        let values: Vec<f64> = (0..72).map(|i| (i / 24) as f64 + 1.0).collect();
        let table = featured(values);

        let peaks = peak_days(&table, 3).unwrap();
        assert_eq!(
            peaks,
            vec![
                ("Wednesday".to_string(), 3.0),
                ("Tuesday".to_string(), 2.0),
                ("Monday".to_string(), 1.0),
            ]
        );
    }

    #[test]
    fn test_peaks_on_empty_table() {
        let table = featured(Vec::new());
        assert!(peak_hours(&table, 5).unwrap().is_empty());
        assert!(peak_days(&table, 3).unwrap().is_empty());
    }

    #[test]
    fn test_summary_stats() {
        let table = featured(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let stats = summary_stats(&table).unwrap();

        assert_eq!(stats.total_records, 8);
        assert_eq!(stats.date_range_start.as_deref(), Some("2024-01-01"));
        assert_eq!(stats.date_range_end.as_deref(), Some("2024-01-01"));
        assert_relative_eq!(stats.avg_volume.unwrap(), 5.0);
        assert_eq!(stats.max_volume, Some(9.0));
        assert_eq!(stats.min_volume, Some(2.0));
        // Sample std: sum of squared deviations is 32 over 7 degrees of freedom
        assert_relative_eq!(stats.std_volume.unwrap(), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_summary_stats_single_and_empty() {
        let single = summary_stats(&featured(vec![3.0])).unwrap();
        assert_eq!(single.avg_volume, Some(3.0));
        assert_eq!(single.std_volume, None);

        let empty = summary_stats(&featured(Vec::new())).unwrap();
        assert_eq!(empty.total_records, 0);
        assert_eq!(empty.date_range_start, None);
        assert!(empty.to_string().contains("Records:  0"));
    }
}
