//! Timestamp derivation for activity events.

use crate::error::{EtlError, Result};
use crate::tables::TimeEntry;
use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

/// Time zone used to break event instants into calendar fields.
///
/// Only UTC and fixed offsets are supported, so results never depend on the
/// host's local time zone or on daylight saving rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTimezone(FixedOffset);

impl EventTimezone {
    pub fn utc() -> Self {
        Self(Utc.fix())
    }

    pub fn offset(&self) -> FixedOffset {
        self.0
    }
}

impl Default for EventTimezone {
    fn default() -> Self {
        Self::utc()
    }
}

impl FromStr for EventTimezone {
    type Err = String;

    /// Accepts `UTC`, `Z`, or an offset like `+05:30`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("z") {
            return Ok(Self::utc());
        }
        s.parse::<FixedOffset>()
            .map(Self)
            .map_err(|e| format!("invalid timezone '{}': {} (use UTC or +HH:MM)", s, e))
    }
}

impl fmt::Display for EventTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.local_minus_utc() == 0 {
            write!(f, "UTC")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Epoch milliseconds to epoch seconds, truncating toward zero.
pub fn start_time_from_millis(ts: i64) -> i64 {
    ts / 1000
}

/// Calendar breakdown of an event timestamp given in epoch milliseconds.
pub fn derive_time_entry(ts: i64, timezone: EventTimezone) -> Result<TimeEntry> {
    let start_time = start_time_from_millis(ts);
    let datetime = DateTime::from_timestamp(start_time, 0)
        .ok_or(EtlError::InvalidTimestamp(ts))?
        .with_timezone(&timezone.offset());

    Ok(TimeEntry {
        start_time,
        hour: datetime.hour() as i32,
        day: datetime.day() as i32,
        week: datetime.iso_week().week() as i32,
        month: datetime.month() as i32,
        year: datetime.year(),
        weekday: datetime.format("%a").to_string(),
    })
}
