//! Connection sources.
//!
//! The profile engine pulls connections one at a time, in time order, from a
//! [`ConnectionSource`]. Sources are re-scoped per query to a departure-time
//! window and a scan direction: the engine scans backward (descending
//! departure time), the bound heuristic forward.
//!
//! Two sources are provided:
//! - [`StaticConnections`]: an in-memory timetable, typically loaded from a
//!   dataset file
//! - [`linked::LinkedConnectionsSource`]: a remote Linked Connections server
//!   paginated through hydra links

mod error;
pub mod linked;
mod memory;

use std::fmt;
use std::sync::Arc;

use crate::domain::{Connection, Timestamp};

pub use error::SourceError;
pub use memory::StaticConnections;

/// Direction of a scan over departure times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    /// Descending departure time (profile computation).
    #[default]
    Backward,
    /// Ascending departure time (earliest-arrival scans).
    Forward,
}

/// An inclusive departure-time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub lower: Timestamp,
    pub upper: Timestamp,
}

impl TimeWindow {
    pub fn new(lower: Timestamp, upper: Timestamp) -> Self {
        Self { lower, upper }
    }

    /// A window admitting every finite departure time.
    pub fn unbounded() -> Self {
        Self {
            lower: Timestamp::from_unix_seconds(i64::MIN),
            upper: Timestamp::INFINITY,
        }
    }

    /// Returns true if `time` lies within the window.
    pub fn contains(&self, time: Timestamp) -> bool {
        self.lower <= time && time <= self.upper
    }

    /// Returns true if no time can satisfy the window.
    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?}]", self.lower, self.upper)
    }
}

/// Pull-based stream of connections in time order.
///
/// Implementations should yield connections within the current window in
/// the requested order, but consumers never trust that: out-of-order and
/// inconsistent connections are detected and discarded by the scans.
pub trait ConnectionSource {
    /// Restart the stream over a new window and direction.
    fn rescope(&mut self, window: TimeWindow, order: ScanOrder);

    /// Next connection, or `None` once the window is exhausted.
    async fn next_connection(&mut self) -> Result<Option<Arc<Connection>>, SourceError>;
}
