//! In-memory connection source.

use std::sync::Arc;

use crate::domain::Connection;

use super::{ConnectionSource, ScanOrder, SourceError, TimeWindow};

/// A static timetable held in memory.
///
/// Connections are kept sorted by departure time, so any window is a
/// contiguous slice that can be drained from either end.
#[derive(Debug, Clone)]
pub struct StaticConnections {
    /// Sorted by ascending departure time.
    connections: Vec<Arc<Connection>>,
    order: ScanOrder,
    /// Unread range of the current window: `front..back`.
    front: usize,
    back: usize,
}

impl StaticConnections {
    /// Create a source over the given connections.
    ///
    /// The initial scope is unbounded and backward.
    pub fn new(connections: Vec<Connection>) -> Self {
        let mut connections: Vec<Arc<Connection>> =
            connections.into_iter().map(Arc::new).collect();
        connections.sort_by_key(|c| c.departure_time);
        let back = connections.len();
        Self {
            connections,
            order: ScanOrder::Backward,
            front: 0,
            back,
        }
    }

    /// Returns the total number of connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns true if the timetable is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Returns the number of connections left in the current scope.
    pub fn remaining(&self) -> usize {
        self.back - self.front
    }
}

impl ConnectionSource for StaticConnections {
    fn rescope(&mut self, window: TimeWindow, order: ScanOrder) {
        self.order = order;
        if window.is_empty() {
            self.front = 0;
            self.back = 0;
            return;
        }
        self.front = self
            .connections
            .partition_point(|c| c.departure_time < window.lower);
        self.back = self
            .connections
            .partition_point(|c| c.departure_time <= window.upper);
    }

    async fn next_connection(&mut self) -> Result<Option<Arc<Connection>>, SourceError> {
        if self.front >= self.back {
            return Ok(None);
        }
        let connection = match self.order {
            ScanOrder::Forward => {
                self.front += 1;
                &self.connections[self.front - 1]
            }
            ScanOrder::Backward => {
                self.back -= 1;
                &self.connections[self.back]
            }
        };
        Ok(Some(Arc::clone(connection)))
    }
}
