//! Connections: single vehicle hops between two stops.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{DomainError, StopId, Timestamp, TripId};

/// One scheduled vehicle hop, tagged with the trip it belongs to.
///
/// Connections are immutable once read. Construction does not validate the
/// time order because sources hand over whatever the data says; the profile
/// scan checks [`Connection::validate`] and discards inconsistent ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Source identifier (for example the Linked Connections `@id`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub departure_stop: StopId,
    pub departure_time: Timestamp,
    pub arrival_stop: StopId,
    pub arrival_time: Timestamp,
    #[serde(rename = "tripId")]
    pub trip: TripId,
}

impl Connection {
    /// Create a connection without an identifier.
    pub fn new(
        departure_stop: StopId,
        departure_time: Timestamp,
        arrival_stop: StopId,
        arrival_time: Timestamp,
        trip: TripId,
    ) -> Self {
        Self {
            id: None,
            departure_stop,
            departure_time,
            arrival_stop,
            arrival_time,
            trip,
        }
    }

    /// Attach a source identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Check that both times are finite and the connection departs strictly
    /// before it arrives.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.departure_time.is_infinite()
            || self.arrival_time.is_infinite()
            || self.departure_time >= self.arrival_time
        {
            return Err(DomainError::InconsistentConnection {
                departure: self.departure_time,
                arrival: self.arrival_time,
            });
        }
        Ok(())
    }

    /// Time spent on board.
    pub fn duration(&self) -> Duration {
        self.arrival_time.signed_duration_since(self.departure_time)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} {} ({})",
            self.departure_stop,
            self.departure_time,
            self.arrival_stop,
            self.arrival_time,
            self.trip
        )
    }
}
