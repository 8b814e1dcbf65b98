//! Stop and trip identifiers.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier: {reason}")]
pub struct InvalidId {
    reason: &'static str,
}

fn check(s: &str) -> Result<(), InvalidId> {
    if s.is_empty() {
        return Err(InvalidId {
            reason: "must not be empty",
        });
    }
    if s.chars().any(char::is_whitespace) {
        return Err(InvalidId {
            reason: "must not contain whitespace",
        });
    }
    Ok(())
}

/// Identifier of a stop.
///
/// Stops are discovered while scanning, so there is no fixed universe to
/// validate against: any non-empty, whitespace-free string (typically an IRI
/// such as `http://irail.be/stations/NMBS/008812005`) is accepted. Cloning is
/// cheap, the text is shared.
///
/// # Examples
///
/// ```
/// use csa_planner::domain::StopId;
///
/// let stop = StopId::parse("http://irail.be/stations/NMBS/008812005").unwrap();
/// assert_eq!(stop.as_str(), "http://irail.be/stations/NMBS/008812005");
///
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse("two words").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopId(Arc<str>);

impl StopId {
    /// Parse a stop identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        check(s)?;
        Ok(Self(Arc::from(s)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StopId {
    type Error = InvalidId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        check(&s)?;
        Ok(Self(Arc::from(s)))
    }
}

impl From<StopId> for String {
    fn from(id: StopId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.as_str())
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a trip: one vehicle run, shared by all of its connections.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TripId(Arc<str>);

impl TripId {
    /// Parse a trip identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        check(s)?;
        Ok(Self(Arc::from(s)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TripId {
    type Error = InvalidId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        check(&s)?;
        Ok(Self(Arc::from(s)))
    }
}

impl From<TripId> for String {
    fn from(id: TripId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Debug for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TripId({})", self.as_str())
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
