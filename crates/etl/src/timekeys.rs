//! Event-time derivation for the `time` dimension and `songplays` partitions.
//!
//! All calendar fields are computed in UTC.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::error::PipelineError;

/// Epoch milliseconds → epoch seconds, flooring toward negative infinity.
pub fn start_time(ts_millis: i64) -> i64 {
    ts_millis.div_euclid(1000)
}

/// Calendar breakdown of one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub hour: i32,
    /// Day of month, 1..=31.
    pub day: i32,
    /// ISO-8601 week of year, 1..=53.
    pub week: i32,
    pub month: i32,
    pub year: i32,
    /// Day of week, 1 = Sunday .. 7 = Saturday.
    pub weekday: i32,
}

impl CalendarFields {
    pub fn from_epoch_seconds(seconds: i64) -> Result<Self, PipelineError> {
        DateTime::<Utc>::from_timestamp(seconds, 0)
            .map(|dt| Self::from_datetime(&dt))
            .ok_or(PipelineError::InvalidTimestamp { ts: seconds })
    }

    fn from_datetime(dt: &DateTime<Utc>) -> Self {
        Self {
            hour: dt.hour() as i32,
            day: dt.day() as i32,
            week: dt.iso_week().week() as i32,
            month: dt.month() as i32,
            year: dt.year(),
            weekday: dt.weekday().number_from_sunday() as i32,
        }
    }
}
