use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Calendar breakdown of a songplay timestamp.
///
/// Every field is derived from `start_time` (milliseconds since the Unix
/// epoch) in UTC, so a row never changes once inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeDimension {
    pub start_time: i64,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// Day of the week, Monday = 0 through Sunday = 6.
    pub weekday: u32,
}

impl TimeDimension {
    /// Derive the calendar fields for an epoch-millisecond timestamp.
    pub fn from_millis(start_time: i64) -> Result<Self> {
        let at: DateTime<Utc> = DateTime::from_timestamp_millis(start_time).ok_or_else(|| {
            Error::InvalidData(format!("timestamp {start_time} is out of range"))
        })?;

        Ok(Self {
            start_time,
            hour: at.hour(),
            day: at.day(),
            week: at.iso_week().week(),
            month: at.month(),
            year: at.year(),
            weekday: at.weekday().num_days_from_monday(),
        })
    }

    /// English name of `weekday`.
    #[must_use]
    pub fn weekday_name(&self) -> &'static str {
        match self.weekday {
            0 => "Monday",
            1 => "Tuesday",
            2 => "Wednesday",
            3 => "Thursday",
            4 => "Friday",
            5 => "Saturday",
            _ => "Sunday",
        }
    }
}
