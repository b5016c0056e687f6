//! Timetable time handling.
//!
//! Linked Connections publishes departure and arrival instants as RFC 3339
//! timestamps in UTC, with delays as separate offsets in seconds. This module
//! provides an absolute instant type with second precision and a signed delay
//! type to go with it.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, Timelike, Utc};
use std::fmt;
use std::ops::{Add, Sub};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// An absolute instant on the timetable, in UTC with second precision.
///
/// Sub-second parts are dropped at construction so that two connections
/// published as `10:00:00.000Z` and `10:00:00Z` compare equal.
///
/// # Examples
///
/// ```
/// use lc_planner::domain::TransitTime;
///
/// let time = TransitTime::parse_rfc3339("2018-08-09T10:00:00.000Z").unwrap();
/// assert_eq!(time.to_string(), "10:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitTime(DateTime<Utc>);

impl TransitTime {
    /// Create a time from a UTC instant, truncated to whole seconds.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant.with_nanosecond(0).unwrap_or(instant))
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Create a time from seconds since the Unix epoch.
    pub fn from_timestamp(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self)
    }

    /// Parse an RFC 3339 timestamp such as `2018-08-09T10:00:00.000Z`.
    ///
    /// Offsets other than `Z` are accepted and normalised to UTC.
    ///
    /// # Examples
    ///
    /// ```
    /// use lc_planner::domain::TransitTime;
    ///
    /// assert!(TransitTime::parse_rfc3339("2018-08-09T10:00:00Z").is_ok());
    /// assert!(TransitTime::parse_rfc3339("2018-08-09T12:00:00+02:00").is_ok());
    /// assert!(TransitTime::parse_rfc3339("10:00").is_err());
    /// ```
    pub fn parse_rfc3339(s: &str) -> Result<Self, TimeError> {
        let parsed = DateTime::parse_from_rfc3339(s.trim())
            .map_err(|_| TimeError::new("expected RFC 3339 timestamp"))?;
        Ok(Self::new(parsed.with_timezone(&Utc)))
    }

    /// Parse a time from "HH:MM" format on a given UTC date.
    ///
    /// # Examples
    ///
    /// ```
    /// use lc_planner::domain::TransitTime;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2018, 8, 9).unwrap();
    ///
    /// assert!(TransitTime::parse_hhmm("00:00", date).is_ok());
    /// assert!(TransitTime::parse_hhmm("23:59", date).is_ok());
    ///
    /// assert!(TransitTime::parse_hhmm("1430", date).is_err());
    /// assert!(TransitTime::parse_hhmm("14:3", date).is_err());
    /// assert!(TransitTime::parse_hhmm("25:00", date).is_err());
    /// ```
    pub fn parse_hhmm(s: &str, date: NaiveDate) -> Result<Self, TimeError> {
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| TimeError::new("invalid time"))?;

        Ok(Self(date.and_time(time).and_utc()))
    }

    /// Returns the underlying UTC instant.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Seconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns the UTC date.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Returns the UTC hour (0-23).
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// Formats the instant the way Linked Connections servers expect it in
    /// query strings, e.g. `2018-08-09T10:00:00.000Z`.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Add a duration to this time.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.0.checked_add_signed(duration).map(Self)
    }

    /// Subtract a duration from this time.
    pub fn checked_sub(&self, duration: Duration) -> Option<Self> {
        self.0.checked_sub_signed(duration).map(Self)
    }

    /// Returns the duration between two times.
    ///
    /// Returns a negative duration if `other` is after `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// The time shifted by a delay, i.e. the expected rather than the
    /// scheduled instant.
    pub fn delayed(&self, delay: Delay) -> Self {
        self.checked_add(delay.as_duration()).unwrap_or(*self)
    }
}

impl Add<Duration> for TransitTime {
    type Output = Self;

    /// # Panics
    ///
    /// Panics if the result leaves chrono's representable range.
    fn add(self, rhs: Duration) -> Self::Output {
        self.checked_add(rhs).expect("time overflow")
    }
}

impl Sub<Duration> for TransitTime {
    type Output = Self;

    /// # Panics
    ///
    /// Panics if the result leaves chrono's representable range.
    fn sub(self, rhs: Duration) -> Self::Output {
        self.checked_sub(rhs).expect("time overflow")
    }
}

impl fmt::Debug for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransitTime({})",
            self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

impl fmt::Display for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// A signed offset from a scheduled time, in seconds.
///
/// Positive values are late running, negative values early running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Delay(i64);

impl Delay {
    /// No delay.
    pub const ZERO: Delay = Delay(0);

    /// Create a delay from a number of seconds.
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Create a delay from a number of minutes.
    pub fn from_mins(mins: i64) -> Self {
        Self(mins * 60)
    }

    /// The delay in seconds.
    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// The delay as a chrono duration.
    pub fn as_duration(&self) -> Duration {
        Duration::seconds(self.0)
    }

    /// Returns true if the time is as scheduled.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mins = self.0 / 60;
        if self.0 >= 0 {
            write!(f, "+{mins}'")
        } else {
            write!(f, "{mins}'")
        }
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}
