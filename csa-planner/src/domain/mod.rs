//! Domain types for the journey planner.
//!
//! This module contains the value types shared by the sources, the profile
//! engine and the journey extractor. Identifiers and journeys enforce their
//! invariants at construction time; connections are checked by the scan.

mod connection;
mod error;
mod journey;
mod stop;
mod time;

pub use connection::Connection;
pub use error::DomainError;
pub use journey::{Interleg, Journey, Leg, Segment};
pub use stop::{InvalidId, StopId, TripId};
pub use time::{TimeError, Timestamp};
