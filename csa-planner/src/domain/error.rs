//! Domain error types.
//!
//! These errors represent validation failures and data inconsistencies
//! in the domain layer. They are distinct from source/IO errors.

use super::{StopId, Timestamp};

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A connection with an infinite time, or that does not depart strictly
    /// before it arrives
    #[error("inconsistent connection: departure {departure:?} is not before arrival {arrival:?}")]
    InconsistentConnection {
        departure: Timestamp,
        arrival: Timestamp,
    },

    /// A segment that arrives before it departs, or with infinite times
    #[error("invalid segment: {0}")]
    InvalidSegment(&'static str),

    /// Consecutive segments don't share a stop
    #[error("segments do not connect: {0} and {1}")]
    StopsNotConnected(StopId, StopId),

    /// A segment departs before the previous one arrives
    #[error("journey goes back in time at {0}")]
    NegativeHop(StopId),

    /// The number of vehicle legs disagrees with the transfer count
    #[error("journey has {legs} legs but claims {transfers} transfers")]
    TransferMismatch { legs: usize, transfers: usize },

    /// Journey has no segments
    #[error("journey must have at least one segment")]
    EmptyJourney,
}
