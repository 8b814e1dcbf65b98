//! Conversion from JSON-LD page DTOs to domain types.

use std::sync::Arc;

use tracing::warn;

use crate::domain::{Connection, StopId, Timestamp, TripId};

use super::types::{LinkedConnection, LinkedConnectionsPage};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    #[error("invalid stop identifier: {0}")]
    InvalidStop(String),

    #[error("invalid trip identifier: {0}")]
    InvalidTrip(String),

    #[error("invalid time: {0}")]
    InvalidTime(String),
}

/// A page converted to domain connections.
#[derive(Debug, Clone, Default)]
pub struct ConvertedPage {
    /// Sorted by ascending departure time.
    pub connections: Vec<Arc<Connection>>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// Convert a page, skipping graph nodes that aren't usable connections.
pub fn convert_page(page: &LinkedConnectionsPage) -> ConvertedPage {
    let mut connections = Vec::with_capacity(page.graph.len());

    for node in &page.graph {
        if node.kind.as_deref().is_some_and(|k| !k.ends_with("Connection")) {
            continue;
        }
        match convert_connection(node) {
            Ok(connection) => connections.push(Arc::new(connection)),
            Err(e) => {
                warn!(
                    connection = node.id.as_deref().unwrap_or("<anonymous>"),
                    error = %e,
                    "skipping connection"
                );
            }
        }
    }

    connections.sort_by_key(|c| c.departure_time);

    ConvertedPage {
        connections,
        next: page.next.clone(),
        previous: page.previous.clone(),
    }
}

/// Convert a single graph node.
pub fn convert_connection(node: &LinkedConnection) -> Result<Connection, ConversionError> {
    let departure_stop = StopId::parse(&node.departure_stop)
        .map_err(|_| ConversionError::InvalidStop(node.departure_stop.clone()))?;
    let arrival_stop = StopId::parse(&node.arrival_stop)
        .map_err(|_| ConversionError::InvalidStop(node.arrival_stop.clone()))?;
    let trip =
        TripId::parse(&node.trip).map_err(|_| ConversionError::InvalidTrip(node.trip.clone()))?;
    let departure_time = Timestamp::parse_rfc3339(&node.departure_time)
        .map_err(|_| ConversionError::InvalidTime(node.departure_time.clone()))?;
    let arrival_time = Timestamp::parse_rfc3339(&node.arrival_time)
        .map_err(|_| ConversionError::InvalidTime(node.arrival_time.clone()))?;

    let connection = Connection::new(
        departure_stop,
        departure_time,
        arrival_stop,
        arrival_time,
        trip,
    );
    Ok(match &node.id {
        Some(id) => connection.with_id(id.clone()),
        None => connection,
    })
}
