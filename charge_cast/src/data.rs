//! Reading table loading and access

use crate::error::{ForecastError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Name of the timestamp column
pub const TIME_COLUMN: &str = "time";

/// Timestamp layouts accepted in the `time` column, tried in order
const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Time-stamped charging readings, one column per zone
///
/// The `time` column is held as Int64 epoch milliseconds so that row
/// filtering and slicing keep timestamps aligned with the values.
#[derive(Debug, Clone)]
pub struct ReadingTable {
    /// Data frame holding the time column, zone columns and derived columns
    df: DataFrame,
    /// Names of the charging zone columns, in file order
    zones: Vec<String>,
}

/// Loader for reading tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load readings from a CSV file with a `time` column and numeric zone columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<ReadingTable> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ForecastError::InputError(format!("Cannot open '{}': {}", path.display(), e))
        })?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()
            .map_err(|e| {
                ForecastError::InputError(format!("Cannot parse '{}': {}", path.display(), e))
            })?;

        debug!(rows = df.height(), path = %path.display(), "loaded readings");
        Self::from_dataframe(df)
    }

    /// Create a reading table from an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> Result<ReadingTable> {
        let mut df = df;

        let time = df.column(TIME_COLUMN).map_err(|_| {
            ForecastError::InputError(format!("Missing '{}' column", TIME_COLUMN))
        })?;
        let millis = parse_time_column(time)?;
        df.with_column(Series::new(TIME_COLUMN, millis))?;

        let zones: Vec<String> = df
            .get_column_names()
            .iter()
            .filter(|name| *name != &TIME_COLUMN)
            .map(|name| name.to_string())
            .collect();

        // a header-only file leaves every column inferred as text
        let empty = df.height() == 0;
        for zone in &zones {
            let series = df.column(zone)?;
            if !empty && !series.dtype().is_numeric() {
                return Err(ForecastError::InputError(format!(
                    "Zone column '{}' is not numeric ({})",
                    zone,
                    series.dtype()
                )));
            }
            let values = series.cast(&DataType::Float64)?;
            df.with_column(values)?;
        }

        Ok(ReadingTable { df, zones })
    }
}

/// Convert a time column of any supported dtype into epoch milliseconds
fn parse_time_column(series: &Series) -> Result<Vec<i64>> {
    let missing = |row: usize| ForecastError::InputError(format!("Missing timestamp in row {}", row));

    match series.dtype() {
        DataType::Utf8 => series
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, raw)| {
                let raw = raw.ok_or_else(|| missing(row))?;
                parse_timestamp(raw).map(|ts| ts.and_utc().timestamp_millis())
            })
            .collect(),
        DataType::Datetime(unit, time_zone) => {
            let divisor = match unit {
                TimeUnit::Nanoseconds => 1_000_000,
                TimeUnit::Microseconds => 1_000,
                TimeUnit::Milliseconds => 1,
            };
            let shift = match time_zone {
                Some(tz) => local_shift_millis(tz)?,
                None => 0,
            };
            let raw = series.cast(&DataType::Int64)?;
            let values = raw.i64()?;
            values
                .into_iter()
                .enumerate()
                .map(|(row, v)| v.map(|v| v / divisor + shift).ok_or_else(|| missing(row)))
                .collect()
        }
        DataType::Date => {
            let raw = series.cast(&DataType::Int32)?;
            let values = raw.i32()?;
            values
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.map(|days| days as i64 * 86_400_000)
                        .ok_or_else(|| missing(row))
                })
                .collect()
        }
        other => Err(ForecastError::InputError(format!(
            "Column '{}' has unsupported type {}",
            TIME_COLUMN, other
        ))),
    }
}

/// Offset from UTC to local wall-clock time for a fixed-offset zone such as `+01:00`
fn local_shift_millis(time_zone: &str) -> Result<i64> {
    if matches!(time_zone, "UTC" | "Etc/UTC" | "Z") {
        return Ok(0);
    }
    time_zone
        .parse::<FixedOffset>()
        .map(|offset| offset.local_minus_utc() as i64 * 1_000)
        .map_err(|_| {
            ForecastError::InputError(format!(
                "Column '{}' uses time zone '{}'; only fixed offsets are supported",
                TIME_COLUMN, time_zone
            ))
        })
}

/// Parse a single timestamp string
///
/// Timestamps carrying a UTC offset keep their local wall-clock time, so
/// calendar features describe the hour at the charging site.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.naive_local());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    if let Some(ts) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(ts);
    }

    Err(ForecastError::InputError(format!(
        "Unparseable timestamp '{}'",
        raw
    )))
}

fn millis_to_datetime(millis: i64) -> Result<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|ts| ts.naive_utc())
        .ok_or_else(|| ForecastError::InputError(format!("Timestamp {} out of range", millis)))
}

impl ReadingTable {
    /// Create a reading table from timestamps and named zone series
    pub fn new(timestamps: &[NaiveDateTime], zones: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let mut columns = Vec::with_capacity(zones.len() + 1);
        columns.push(Series::new(
            TIME_COLUMN,
            timestamps
                .iter()
                .map(|ts| ts.and_utc().timestamp_millis())
                .collect::<Vec<i64>>(),
        ));

        let mut names = Vec::with_capacity(zones.len());
        for (name, values) in zones {
            if values.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: values.len(),
                });
            }
            columns.push(Series::new(&name, values));
            names.push(name);
        }

        Ok(Self {
            df: DataFrame::new(columns)?,
            zones: names,
        })
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Names of the charging zone columns
    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Whether a column of this name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().contains(&name)
    }

    /// Timestamps of every row
    pub fn timestamps(&self) -> Result<Vec<NaiveDateTime>> {
        let col = self.df.column(TIME_COLUMN)?;
        col.i64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                let millis = v.ok_or_else(|| {
                    ForecastError::InputError(format!("Missing timestamp in row {}", row))
                })?;
                millis_to_datetime(millis)
            })
            .collect()
    }

    /// A numeric column as optional f64 values; nulls stay `None`
    pub fn column_f64(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let col = self
            .df
            .column(name)
            .map_err(|_| ForecastError::InputError(format!("Column '{}' not found", name)))?;
        let values = col.cast(&DataType::Float64)?;
        let values = values.f64()?.into_iter().collect();
        Ok(values)
    }

    /// A numeric column as f64 values, failing on any null
    pub fn column_values(&self, name: &str) -> Result<Vec<f64>> {
        self.column_f64(name)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| {
                    ForecastError::InputError(format!(
                        "Column '{}' has no value in row {}",
                        name, row
                    ))
                })
            })
            .collect()
    }

    /// Copy of this table with a column added or replaced
    pub fn with_column(&self, series: Series) -> Result<Self> {
        let mut df = self.df.clone();
        df.with_column(series)?;
        Ok(Self {
            df,
            zones: self.zones.clone(),
        })
    }

    /// Same zones over a frame derived from this table's frame
    pub(crate) fn replace_dataframe(&self, df: DataFrame) -> Self {
        Self {
            df,
            zones: self.zones.clone(),
        }
    }

    /// Copy of this table without rows holding a null in any column
    pub fn drop_nulls(&self) -> Result<Self> {
        Ok(Self {
            df: self.df.drop_nulls::<String>(None)?,
            zones: self.zones.clone(),
        })
    }

    /// Rows `start..end` (end clamped to the table length)
    pub fn slice(&self, start: usize, end: Option<usize>) -> Self {
        let end = end.unwrap_or(self.len()).min(self.len());
        let start = start.min(end);
        Self {
            df: self.df.slice(start as i64, end - start),
            zones: self.zones.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        for raw in [
            "2024-03-01 13:00:00",
            "2024-03-01T13:00:00",
            "2024-03-01 13:00",
            "2024/03/01 13:00:00",
            "2024-03-01T13:00:00Z",
            "2024-03-01T13:00:00+01:00",
            "2024-03-01T13:00:00-05:00",
        ] {
            assert_eq!(parse_timestamp(raw).unwrap(), expected, "{}", raw);
        }

        let midnight = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(midnight, expected.date().and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_zoned_datetime_column_keeps_local_time() {
        let utc_millis = parse_timestamp("2024-03-01 13:00:00")
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let zoned = Int64Chunked::new(TIME_COLUMN, &[utc_millis])
            .into_datetime(TimeUnit::Milliseconds, Some("+01:00".to_string()))
            .into_series();
        let df = DataFrame::new(vec![zoned, Series::new("a", vec![1.0])]).unwrap();

        let table = DataLoader::from_dataframe(df).unwrap();
        assert_eq!(
            table.timestamps().unwrap(),
            vec![parse_timestamp("2024-03-01 14:00:00").unwrap()]
        );
    }

    #[test]
    fn test_named_time_zone_rejected() {
        assert!(matches!(
            local_shift_millis("Europe/Berlin"),
            Err(ForecastError::InputError(_))
        ));
        assert_eq!(local_shift_millis("UTC").unwrap(), 0);
        assert_eq!(local_shift_millis("-05:00").unwrap(), -5 * 3_600_000);
    }

    #[test]
    fn test_header_only_frame_is_empty_table() {
        let df = DataFrame::new(vec![
            Series::new(TIME_COLUMN, Vec::<&str>::new()),
            Series::new("a", Vec::<&str>::new()),
        ])
        .unwrap();

        let table = DataLoader::from_dataframe(df).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.zones(), &["a".to_string()]);
        assert_eq!(table.dataframe().column("a").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(ForecastError::InputError(_))
        ));
    }

    #[test]
    fn test_new_round_trips_timestamps() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let timestamps: Vec<_> = (0..3).map(|h| start + chrono::Duration::hours(h)).collect();
        let table =
            ReadingTable::new(&timestamps, vec![("a".to_string(), vec![1.0, 2.0, 3.0])]).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.zones(), &["a".to_string()]);
        assert_eq!(table.timestamps().unwrap(), timestamps);
        assert_eq!(table.column_values("a").unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_new_rejects_ragged_zone() {
        let ts = parse_timestamp("2024-01-01 00:00:00").unwrap();
        let result = ReadingTable::new(&[ts], vec![("a".to_string(), vec![1.0, 2.0])]);
        assert!(matches!(
            result,
            Err(ForecastError::DimensionMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_slice_clamps() {
        let ts = parse_timestamp("2024-01-01 00:00:00").unwrap();
        let table = ReadingTable::new(&[ts], vec![("a".to_string(), vec![1.0])]).unwrap();
        assert_eq!(table.slice(0, Some(10)).len(), 1);
        assert!(table.slice(5, None).is_empty());
    }

    #[test]
    fn test_missing_column_is_input_error() {
        let ts = parse_timestamp("2024-01-01 00:00:00").unwrap();
        let table = ReadingTable::new(&[ts], vec![("a".to_string(), vec![1.0])]).unwrap();
        assert!(matches!(
            table.column_f64("b"),
            Err(ForecastError::InputError(_))
        ));
    }
}
