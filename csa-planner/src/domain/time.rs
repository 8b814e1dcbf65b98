//! Instants on the transit timeline.
//!
//! The profile scan compares and takes minima of arrival times constantly, so
//! time is a plain count of seconds since the Unix epoch with a reserved
//! value for "unreachable". Durations are `chrono::Duration`; an unreachable
//! walking distance is `None`.

use std::fmt;
use std::ops::{Add, Sub};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid time.
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

/// A point in time, or infinity.
///
/// Ordering treats [`Timestamp::INFINITY`] as later than every real time, so
/// "best arrival" is simply the minimum.
///
/// # Examples
///
/// ```
/// use csa_planner::domain::Timestamp;
/// use chrono::{Duration, NaiveDate};
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let t = Timestamp::parse_hhmm("08:30", date).unwrap();
/// assert_eq!(t.to_string(), "08:30");
///
/// assert!(t < Timestamp::INFINITY);
/// assert_eq!(Timestamp::INFINITY + Duration::minutes(5), Timestamp::INFINITY);
/// assert_eq!(t.add_distance(None), Timestamp::INFINITY);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Unreachable.
    pub const INFINITY: Self = Self(i64::MAX);

    /// Create a timestamp from seconds since the Unix epoch.
    pub fn from_unix_seconds(secs: i64) -> Self {
        Self(secs)
    }

    /// Seconds since the Unix epoch (`i64::MAX` for infinity).
    pub fn unix_seconds(&self) -> i64 {
        self.0
    }

    /// Returns true for [`Timestamp::INFINITY`].
    pub fn is_infinite(&self) -> bool {
        self.0 == i64::MAX
    }

    /// Returns true for any real point in time.
    pub fn is_finite(&self) -> bool {
        !self.is_infinite()
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    /// Converts to a UTC datetime. `None` for infinity or out-of-range values.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if self.is_infinite() {
            return None;
        }
        DateTime::from_timestamp(self.0, 0)
    }

    /// Parse an RFC 3339 timestamp such as `2018-03-01T08:00:00Z`.
    pub fn parse_rfc3339(s: &str) -> Result<Self, TimeError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|_| TimeError::new("expected RFC 3339 format"))?;
        Ok(Self::from_datetime(dt.with_timezone(&Utc)))
    }

    /// Parse a time from "HH:MM" format on the given (UTC) date.
    ///
    /// # Examples
    ///
    /// ```
    /// use csa_planner::domain::Timestamp;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    ///
    /// assert!(Timestamp::parse_hhmm("00:00", date).is_ok());
    /// assert!(Timestamp::parse_hhmm("23:59", date).is_ok());
    ///
    /// assert!(Timestamp::parse_hhmm("1430", date).is_err());
    /// assert!(Timestamp::parse_hhmm("14:3", date).is_err());
    /// assert!(Timestamp::parse_hhmm("25:00", date).is_err());
    /// ```
    pub fn parse_hhmm(s: &str, date: NaiveDate) -> Result<Self, TimeError> {
        // Must be exactly 5 characters: HH:MM
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

        Ok(Self::from_datetime(date.and_time(time).and_utc()))
    }

    /// Add a duration, returning `None` on overflow or when `self` is infinite.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        if self.is_infinite() {
            return None;
        }
        let secs = self.0.checked_add(duration.num_seconds())?;
        (secs != i64::MAX).then_some(Self(secs))
    }

    /// Add a duration. Infinity absorbs, overflow saturates to infinity.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        self.checked_add(duration).unwrap_or(Self::INFINITY)
    }

    /// Subtract a duration. Infinity absorbs.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        if self.is_infinite() {
            return Self::INFINITY;
        }
        match self.0.checked_sub(duration.num_seconds()) {
            Some(secs) if secs != i64::MAX => Self(secs),
            Some(_) => Self::INFINITY,
            None => Self(i64::MIN),
        }
    }

    /// Add a walking distance that may be infinite.
    pub fn add_distance(&self, distance: Option<Duration>) -> Self {
        match distance {
            Some(d) => self.saturating_add(d),
            None => Self::INFINITY,
        }
    }

    /// Returns the duration between two finite times.
    ///
    /// Negative if `other` is after `self`. Saturates at the bounds of
    /// `Duration`, so an infinite operand never panics.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        let secs = self.0.saturating_sub(other.0);
        Duration::try_seconds(secs).unwrap_or(if secs < 0 {
            Duration::MIN
        } else {
            Duration::MAX
        })
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        self.saturating_sub(rhs)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "Timestamp({})", dt.format("%Y-%m-%d %H:%M:%S")),
            None if self.is_infinite() => f.write_str("Timestamp(∞)"),
            None => write!(f, "Timestamp({}s)", self.0),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%H:%M")),
            None if self.is_infinite() => f.write_str("∞"),
            None => write!(f, "{}s", self.0),
        }
    }
}

/// Infinity serializes as `null`, anything else as RFC 3339.
impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_datetime() {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None if self.is_infinite() => serializer.serialize_none(),
            None => serializer.serialize_i64(self.0),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampRepr {
    Seconds(i64),
    Text(String),
    Infinite(()),
}

/// Accepts epoch seconds, RFC 3339 text, or `null` (infinity).
impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match TimestampRepr::deserialize(deserializer)? {
            TimestampRepr::Seconds(secs) => Ok(Self(secs)),
            TimestampRepr::Text(text) => {
                Self::parse_rfc3339(&text).map_err(serde::de::Error::custom)
            }
            TimestampRepr::Infinite(()) => Ok(Self::INFINITY),
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
