//! Departure-time bounds for the profile scan.
//!
//! The backward scan has to start somewhere. A bounds calculator estimates
//! how late a connection can depart and still be useful, capping the part
//! of the connection stream the profile engine reads. Bounds are advisory:
//! a tight bound can only hide slow journeys, never produce wrong ones.

use std::collections::{HashMap, HashSet};

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, warn};

use crate::connections::{ConnectionSource, ScanOrder, SourceError, TimeWindow};
use crate::distance::DistanceSource;
use crate::domain::{StopId, Timestamp, TripId};

use super::config::PlannerConfig;

/// An inclusive departure-time range to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBounds {
    pub lower: Timestamp,
    pub upper: Timestamp,
}

/// Something that can bound the profile scan for a query.
pub trait BoundsCalculator {
    /// Bounds for journeys from `source` to `target` departing no earlier
    /// than `departure_time`.
    ///
    /// May re-scope and read `connections`; the profile engine re-scopes
    /// it again before scanning.
    async fn calculate_bounds<C: ConnectionSource, D: DistanceSource>(
        &self,
        connections: &mut C,
        distances: &D,
        source: &StopId,
        departure_time: Timestamp,
        target: &StopId,
    ) -> Result<TimeBounds, SourceError>;
}

/// A fixed window after the departure time, without scanning.
#[derive(Debug, Clone, Copy)]
pub struct FixedHorizon {
    horizon: Duration,
}

impl FixedHorizon {
    pub fn new(horizon: Duration) -> Self {
        Self { horizon }
    }
}

impl BoundsCalculator for FixedHorizon {
    async fn calculate_bounds<C: ConnectionSource, D: DistanceSource>(
        &self,
        _connections: &mut C,
        _distances: &D,
        _source: &StopId,
        departure_time: Timestamp,
        _target: &StopId,
    ) -> Result<TimeBounds, SourceError> {
        Ok(TimeBounds {
            lower: departure_time,
            upper: departure_time + self.horizon,
        })
    }
}

/// Bounds from a forward earliest-arrival scan.
///
/// Scans `[departure_time, departure_time + horizon]` forward, tracking the
/// earliest known arrival per stop without counting transfers. The upper
/// bound is the departure time plus `slack_factor` times the estimated
/// travel time to the target.
#[derive(Debug, Clone, Copy)]
pub struct EarliestArrivalHeuristic {
    horizon: Duration,
    slack_factor: i32,
}

impl EarliestArrivalHeuristic {
    pub fn new(horizon: Duration, slack_factor: i32) -> Self {
        Self {
            horizon,
            slack_factor,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.bound_horizon(), config.bound_slack_factor)
    }

    /// Forward scan; returns the earliest arrival at `target` if found.
    async fn earliest_arrival<C: ConnectionSource, D: DistanceSource>(
        &self,
        connections: &mut C,
        distances: &D,
        source: &StopId,
        departure_time: Timestamp,
        target: &StopId,
    ) -> Result<Option<Timestamp>, SourceError> {
        let mut earliest: HashMap<StopId, Timestamp> = HashMap::new();
        earliest.insert(source.clone(), departure_time);
        for isd in distances.distances_for_stop(source).await? {
            let other = isd.other_end(source);
            if other != source {
                improve(&mut earliest, other, departure_time + isd.duration);
            }
        }

        let window = TimeWindow::new(departure_time, departure_time + self.horizon);
        connections.rescope(window, ScanOrder::Forward);

        let mut boarded: HashSet<TripId> = HashSet::new();
        let mut current_departure = departure_time;

        while let Some(connection) = connections.next_connection().await? {
            if earliest
                .get(target)
                .is_some_and(|&t| connection.departure_time >= t)
            {
                break;
            }
            if connection.departure_time < current_departure {
                warn!(%connection, "connection not in order, discarded");
                continue;
            }
            if connection.validate().is_err() {
                warn!(%connection, "connection does not depart before it arrives, discarded");
                continue;
            }
            current_departure = connection.departure_time;

            let reachable = boarded.contains(&connection.trip)
                || earliest
                    .get(&connection.departure_stop)
                    .is_some_and(|&t| t <= connection.departure_time);
            if !reachable {
                continue;
            }
            boarded.insert(connection.trip.clone());

            if improve(
                &mut earliest,
                &connection.arrival_stop,
                connection.arrival_time,
            ) {
                for isd in distances
                    .distances_for_stop(&connection.arrival_stop)
                    .await?
                {
                    let other = isd.other_end(&connection.arrival_stop);
                    if other != &connection.arrival_stop {
                        improve(&mut earliest, other, connection.arrival_time + isd.duration);
                    }
                }
            }
        }

        Ok(earliest.get(target).copied())
    }
}

impl Default for EarliestArrivalHeuristic {
    fn default() -> Self {
        Self::from_config(&PlannerConfig::default())
    }
}

impl BoundsCalculator for EarliestArrivalHeuristic {
    async fn calculate_bounds<C: ConnectionSource, D: DistanceSource>(
        &self,
        connections: &mut C,
        distances: &D,
        source: &StopId,
        departure_time: Timestamp,
        target: &StopId,
    ) -> Result<TimeBounds, SourceError> {
        if source == target {
            return Ok(TimeBounds {
                lower: departure_time,
                upper: departure_time,
            });
        }

        let upper = match self
            .earliest_arrival(connections, distances, source, departure_time, target)
            .await?
        {
            Some(arrival) => {
                let gap = arrival.signed_duration_since(departure_time);
                departure_time + gap.checked_mul(self.slack_factor).unwrap_or(Duration::MAX)
            }
            None => {
                debug!(%source, %target, "target not reached within horizon");
                departure_time + self.horizon
            }
        };

        debug!(%source, %target, lower = ?departure_time, upper = ?upper, "bounds calculated");
        Ok(TimeBounds {
            lower: departure_time,
            upper,
        })
    }
}

/// Lower the earliest arrival at `stop`; returns true if it improved.
fn improve(earliest: &mut HashMap<StopId, Timestamp>, stop: &StopId, time: Timestamp) -> bool {
    match earliest.get_mut(stop) {
        Some(t) if *t <= time => false,
        Some(t) => {
            *t = time;
            true
        }
        None => {
            earliest.insert(stop.clone(), time);
            true
        }
    }
}
