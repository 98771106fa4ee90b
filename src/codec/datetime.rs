use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use super::EncodingError;

/// The default units of an encoded datetime.
pub const DEFAULT_TIME_UNITS: &str = "seconds since 1970-01-01 00:00:00";

/// The default calendar of an encoded datetime.
pub const DEFAULT_CALENDAR: &str = "gregorian";

const CALENDARS: [&str; 3] = ["standard", "gregorian", "proleptic_gregorian"];

/// Check that `calendar` is supported.
///
/// The `standard`, `gregorian` and `proleptic_gregorian` calendars are supported, and all are treated as the proleptic
/// Gregorian calendar.
///
/// # Errors
/// Returns [`EncodingError::UnsupportedCalendar`] for any other calendar.
pub fn check_calendar(calendar: &str) -> Result<(), EncodingError> {
    if CALENDARS.contains(&calendar.trim().to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(EncodingError::UnsupportedCalendar(calendar.to_string()))
    }
}

/// A time unit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeUnit {
    /// Days.
    Days,
    /// Hours.
    Hours,
    /// Minutes.
    Minutes,
    /// Seconds.
    Seconds,
    /// Milliseconds.
    Milliseconds,
}

impl TimeUnit {
    /// Return the number of milliseconds in one unit.
    #[must_use]
    pub const fn milliseconds(&self) -> i64 {
        match self {
            Self::Days => 86_400_000,
            Self::Hours => 3_600_000,
            Self::Minutes => 60_000,
            Self::Seconds => 1_000,
            Self::Milliseconds => 1,
        }
    }
}

/// Time units of the form `<unit> since <reference datetime>`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimeUnits {
    unit: TimeUnit,
    reference: NaiveDateTime,
}

impl TimeUnits {
    /// Return the unit.
    #[must_use]
    pub const fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Return the reference datetime.
    #[must_use]
    pub const fn reference(&self) -> NaiveDateTime {
        self.reference
    }

    /// Encode `datetime` as a whole number of units since the reference, rounding down.
    #[must_use]
    pub fn encode(&self, datetime: NaiveDateTime) -> i64 {
        datetime
            .signed_duration_since(self.reference)
            .num_milliseconds()
            .div_euclid(self.unit.milliseconds())
    }

    /// Decode a number of units since the reference, truncated to whole seconds.
    ///
    /// # Errors
    /// Returns [`EncodingError::DateTimeOutOfRange`] if the result is not representable.
    pub fn decode(&self, value: i64) -> Result<NaiveDateTime, EncodingError> {
        let out_of_range = || EncodingError::DateTimeOutOfRange(format!("{value} {self}"));
        let milliseconds = value
            .checked_mul(self.unit.milliseconds())
            .ok_or_else(out_of_range)?;
        let delta = TimeDelta::try_milliseconds(milliseconds).ok_or_else(out_of_range)?;
        let datetime = self
            .reference
            .checked_add_signed(delta)
            .ok_or_else(out_of_range)?;
        datetime.with_nanosecond(0).ok_or_else(out_of_range)
    }
}

impl core::fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let unit = match self.unit {
            TimeUnit::Days => "days",
            TimeUnit::Hours => "hours",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Milliseconds => "milliseconds",
        };
        write!(f, "{unit} since {}", self.reference.format("%Y-%m-%d %H:%M:%S"))
    }
}

impl FromStr for TimeUnits {
    type Err = EncodingError;

    fn from_str(units: &str) -> Result<Self, Self::Err> {
        let invalid = || EncodingError::InvalidUnits(units.to_string());
        let (unit, reference) = units.trim().split_once(" since ").ok_or_else(invalid)?;
        let unit = match unit.trim().to_lowercase().as_str() {
            "days" | "day" => TimeUnit::Days,
            "hours" | "hour" => TimeUnit::Hours,
            "minutes" | "minute" => TimeUnit::Minutes,
            "seconds" | "second" => TimeUnit::Seconds,
            "milliseconds" | "millisecond" => TimeUnit::Milliseconds,
            _ => return Err(invalid()),
        };
        let reference = parse_datetime(reference).ok_or_else(invalid)?;
        Ok(Self { unit, reference })
    }
}

/// Parse a datetime string.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM` and `YYYY-MM-DD HH:MM:SS` with optional fractional seconds.
/// A `T` date/time separator and a trailing `Z` or `UTC` are also accepted.
#[must_use]
pub fn parse_datetime(datetime: &str) -> Option<NaiveDateTime> {
    let datetime = datetime.trim();
    let datetime = datetime
        .strip_suffix("UTC")
        .or_else(|| datetime.strip_suffix('Z'))
        .unwrap_or(datetime)
        .trim_end()
        .replacen('T', " ", 1);
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(&datetime, format) {
            return Some(datetime);
        }
    }
    NaiveDate::parse_from_str(&datetime, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
