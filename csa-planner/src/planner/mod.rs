//! Journey planner using the Connection Scan Algorithm.
//!
//! A query runs in three steps:
//! 1. a [`BoundsCalculator`] estimates how late a useful connection can
//!    depart
//! 2. the [`ProfileEngine`] scans connections backward over that window,
//!    building a per-stop profile of best arrival times by transfer count
//! 3. the [`JourneyExtractor`] replays the profile's journey pointers into
//!    concrete itineraries from the source stop
//!
//! [`Planner`] wires the three together.

mod bounds;
mod config;
mod extract;
mod profile;
mod search;
pub mod vector;

pub use bounds::{BoundsCalculator, EarliestArrivalHeuristic, FixedHorizon, TimeBounds};
pub use config::PlannerConfig;
pub use extract::JourneyExtractor;
pub use profile::{Profile, ProfileEngine, ProfileEntry, ScanStats};
pub use search::{JourneyRequest, JourneyResult, Planner, PlannerError};
