use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// UTC calendar fields handed to the propagation service.
///
/// `month` is one-based (1-12). `second` carries the fractional part with
/// millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
}

impl TimeFields {
    /// Decompose a UTC instant into calendar fields.
    ///
    /// Sub-millisecond precision is dropped. During a leap second chrono
    /// reports more than 1000 ms; those are clamped to 999.
    pub fn from_datetime(instant: &DateTime<Utc>) -> Self {
        let millis = instant.timestamp_subsec_millis().min(999);
        Self {
            year: instant.year(),
            month: instant.month(),
            day: instant.day(),
            hour: instant.hour(),
            minute: instant.minute(),
            second: instant.second() as f64 + millis as f64 / 1000.0,
        }
    }

    /// Month as a zero-based index (0 = January), the streaming header convention.
    pub fn month_zero_based(&self) -> u32 {
        self.month.saturating_sub(1)
    }

    /// Rebuild a naive UTC datetime, rounding the fractional seconds to the
    /// nearest millisecond.
    ///
    /// Returns `None` when the fields do not form a valid calendar date.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        if !self.second.is_finite() || self.second < 0.0 || self.second >= 60.0 {
            return None;
        }
        let whole = self.second.floor();
        let millis = (((self.second - whole) * 1000.0).round() as i64).min(999);
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_opt(self.hour, self.minute, whole as u32)
            .and_then(|dt| dt.checked_add_signed(Duration::milliseconds(millis)))
    }

    /// Rebuild the UTC instant these fields describe.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        self.to_naive().map(|naive| naive.and_utc())
    }

    /// Julian date (UTC, no UT1 correction) of these fields.
    pub fn julian_date(&self) -> f64 {
        let year = self.year as f64;
        let month = self.month as f64;
        let jd = 367.0 * year - (7.0 * (year + ((month + 9.0) / 12.0).floor()) * 0.25).floor()
            + (275.0 * month / 9.0).floor()
            + self.day as f64
            + 1721013.5;
        let day_fraction =
            (self.second + self.minute as f64 * 60.0 + self.hour as f64 * 3600.0) / 86400.0;
        jd + day_fraction
    }
}

impl From<DateTime<Utc>> for TimeFields {
    fn from(instant: DateTime<Utc>) -> Self {
        TimeFields::from_datetime(&instant)
    }
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod time_tests;
