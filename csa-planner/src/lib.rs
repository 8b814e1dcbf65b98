//! Profile-based public-transport journey planner.
//!
//! Answers "how do I get from this stop to that one, leaving no earlier than
//! a given time?" with every Pareto-optimal trade-off between arrival time
//! and number of transfers, using a backward Connection Scan.
//!
//! Timetables come from a [`connections::ConnectionSource`] and walking
//! links from a [`distance::DistanceSource`]; [`planner::Planner`] ties them
//! together.

pub mod connections;
pub mod dataset;
pub mod distance;
pub mod domain;
pub mod planner;
