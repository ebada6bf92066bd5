//! Sine/cosine encodings of periodic calendar fields

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Hours in a day
pub const HOURS_PER_DAY: u32 = 24;
/// Days in a week
pub const DAYS_PER_WEEK: u32 = 7;

/// A point on the unit circle representing a periodic value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CyclicalEncoding {
    pub sin: f64,
    pub cos: f64,
}

impl CyclicalEncoding {
    /// Encode `value` within a cycle of length `period`
    pub fn encode(value: f64, period: f64) -> Self {
        let angle = 2.0 * PI * value / period;
        Self {
            sin: angle.sin(),
            cos: angle.cos(),
        }
    }
}

/// Encode an hour of day (0..24)
pub fn hour_encoding(hour: u32) -> CyclicalEncoding {
    CyclicalEncoding::encode(hour as f64, HOURS_PER_DAY as f64)
}

/// Encode a day of week (0 = Monday .. 6 = Sunday)
pub fn day_of_week_encoding(day_of_week: u32) -> CyclicalEncoding {
    CyclicalEncoding::encode(day_of_week as f64, DAYS_PER_WEEK as f64)
}
