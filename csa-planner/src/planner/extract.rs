//! Journey extraction from a computed profile.
//!
//! Replays the journey pointers recorded by the profile scan into concrete
//! itineraries of legs and interlegs.

use std::collections::HashSet;

use chrono::Duration;
use tracing::{debug, error};

use crate::distance::DistanceSource;
use crate::domain::{Interleg, Journey, Leg, Segment, StopId, Timestamp};

use super::profile::{Profile, ProfileEntry};
use super::search::PlannerError;

/// Materializes journeys from a profile.
///
/// Walking durations come from the raw distance source, not the cache of
/// the scan that produced the profile.
#[derive(Debug, Clone, Copy)]
pub struct JourneyExtractor<'a, D> {
    distances: &'a D,
}

impl<'a, D: DistanceSource> JourneyExtractor<'a, D> {
    pub fn new(distances: &'a D) -> Self {
        Self { distances }
    }

    /// Extract the Pareto-optimal journeys from `source` departing no earlier
    /// than `departure_time`.
    ///
    /// For each usable entry at `source`, one journey is produced per
    /// transfer budget that strictly improves the arrival time over every
    /// smaller budget. Identical journeys are reported once.
    ///
    /// Entries at `source` already have the stop's change time taken off
    /// their departure time. No change happens at the origin, so a budget
    /// that boards at `source` itself is judged by its boarding time.
    pub async fn extract_journeys(
        &self,
        profile: &Profile,
        source: &StopId,
        target: &StopId,
        departure_time: Timestamp,
    ) -> Result<Vec<Journey>, PlannerError> {
        if target != profile.target() {
            return Err(PlannerError::InvalidRequest(format!(
                "profile was computed for {}, not {target}",
                profile.target()
            )));
        }

        let change_time = self
            .distances
            .distance(source, source)
            .await?
            .unwrap_or_else(Duration::zero);
        let earliest_entry = departure_time - change_time;

        let mut journeys: Vec<Journey> = Vec::new();
        let mut seen: HashSet<Journey> = HashSet::new();
        let entries = profile
            .entries(source)
            .iter()
            .filter(|e| e.departure_time >= earliest_entry);

        for entry in entries {
            let mut best = Timestamp::INFINITY;
            for (budget, &arrival) in entry.arrival_times.iter().enumerate() {
                if arrival >= best {
                    continue;
                }
                let Some((enter, _)) = entry.pointers(budget) else {
                    continue;
                };
                let departs = if &enter.departure_stop == source {
                    enter.departure_time
                } else {
                    entry.departure_time
                };
                if departs < departure_time {
                    continue;
                }
                best = arrival;

                let journey = self.extract_journey(profile, source, entry, budget).await?;
                if seen.insert(journey.clone()) {
                    journeys.push(journey);
                }
            }
        }

        debug!(%source, %target, journeys = journeys.len(), "journeys extracted");
        Ok(journeys)
    }

    async fn extract_journey<'p>(
        &self,
        profile: &'p Profile,
        source: &StopId,
        entry: &'p ProfileEntry,
        budget: usize,
    ) -> Result<Journey, PlannerError> {
        let target = profile.target();
        let mut segments = Vec::new();
        let mut legs = 0;

        let (first_enter, _) = entry
            .pointers(budget)
            .ok_or_else(|| inconsistent(source, "entry has no journey pointers"))?;
        if &first_enter.departure_stop != source {
            let walk = self.walk(source, &first_enter.departure_stop).await?;
            segments.push(Segment::Interleg(Interleg::new(
                source.clone(),
                first_enter.departure_stop.clone(),
                entry.departure_time,
                walk,
            )));
        }

        let mut current = entry;
        let mut budget = budget;
        let (stop, arrival) = loop {
            let at = segments
                .last()
                .map(Segment::destination)
                .unwrap_or(source)
                .clone();
            let (enter, exit) = current
                .pointers(budget)
                .ok_or_else(|| inconsistent(&at, "entry has no journey pointers"))?;
            let leg = Leg::ride(enter, exit).map_err(|e| inconsistent(&at, &e.to_string()))?;
            let stop = leg.arrival_stop.clone();
            let arrival = leg.arrival_time;
            segments.push(Segment::Leg(leg));
            legs += 1;

            let alight = if &stop == target {
                arrival
            } else {
                arrival.add_distance(self.distances.distance(&stop, target).await?)
            };
            if budget == 0 || alight <= current.arrival_times[budget] {
                break (stop, arrival);
            }

            budget -= 1;
            let (next, walk) = self.next_entry(profile, &stop, arrival, budget).await?;
            let (next_enter, _) = next
                .pointers(budget)
                .ok_or_else(|| inconsistent(&stop, "entry has no journey pointers"))?;
            segments.push(Segment::Interleg(Interleg::new(
                stop,
                next_enter.departure_stop.clone(),
                arrival,
                walk,
            )));
            current = next;
        };

        if &stop != target {
            let walk = self.walk(&stop, target).await?;
            segments.push(Segment::Interleg(Interleg::new(
                stop,
                target.clone(),
                arrival,
                walk,
            )));
        }

        Journey::new(segments, legs - 1).map_err(|e| inconsistent(source, &e.to_string()))
    }

    /// Find where the journey continues after arriving at `stop`.
    ///
    /// Entries are tried earliest departure first; the first one whose
    /// boarding connection can still be caught after walking to it wins.
    async fn next_entry<'p>(
        &self,
        profile: &'p Profile,
        stop: &StopId,
        arrival: Timestamp,
        budget: usize,
    ) -> Result<(&'p ProfileEntry, Duration), PlannerError> {
        for entry in profile.entries(stop).iter().rev() {
            let Some((enter, _)) = entry.pointers(budget) else {
                continue;
            };
            let Some(walk) = self
                .distances
                .distance(stop, &enter.departure_stop)
                .await?
            else {
                continue;
            };
            if enter.departure_time >= arrival + walk {
                return Ok((entry, walk));
            }
        }
        Err(inconsistent(stop, "no profile entry continues the journey"))
    }

    async fn walk(&self, from: &StopId, to: &StopId) -> Result<Duration, PlannerError> {
        self.distances
            .distance(from, to)
            .await?
            .ok_or_else(|| inconsistent(from, &format!("no footpath to {to}")))
    }
}

/// Journey pointers that can't be replayed mean the profile is corrupt.
fn inconsistent(stop: &StopId, message: &str) -> PlannerError {
    error!(%stop, reason = message, "journey pointers are inconsistent");
    PlannerError::Inconsistent {
        stop: stop.clone(),
        message: message.to_string(),
    }
}
