//! Profile computation: the backward connection scan.
//!
//! Connections are folded in one at a time in descending departure order.
//! Every stop accumulates a list of [`ProfileEntry`]s sorted by strictly
//! decreasing departure time, each holding the best arrival time at the
//! target per transfer budget plus the journey pointers needed to replay it.
//!
//! Two invariants hold after every step, for every stop:
//! - an entry departing earlier is component-wise no worse than any entry
//!   departing later
//! - within an entry, arrival times never increase with the transfer budget
//!
//! Every finite arrival time carries an (enter, exit) pointer pair. Riding
//! from `enter` to `exit` and then either alighting towards the target or
//! continuing from the exit stop's profile, with one transfer less, reaches
//! the target no later than the recorded time. Pointers are always copied
//! together with the value they explain.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::connections::{ConnectionSource, ScanOrder, SourceError, TimeWindow};
use crate::distance::{CacheUsageReport, DistanceSource, IsdCache};
use crate::domain::{Connection, StopId, Timestamp, TripId};

use super::vector::{
    dominates, entry_index_at, eval_profile, infinity_vector, min_vector, shift_vector,
};

/// One step of a stop's profile function.
///
/// Departing the stop no earlier than `departure_time` reaches the target by
/// `arrival_times[i]` using at most `i` transfers, boarding at
/// `enter_connections[i]` and alighting after `exit_connections[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub departure_time: Timestamp,
    pub arrival_times: Vec<Timestamp>,
    pub enter_connections: Vec<Option<Arc<Connection>>>,
    pub exit_connections: Vec<Option<Arc<Connection>>>,
}

impl ProfileEntry {
    /// The all-infinity entry every stop starts with.
    fn sentinel(max_legs: usize) -> Self {
        Self {
            departure_time: Timestamp::INFINITY,
            arrival_times: infinity_vector(max_legs),
            enter_connections: vec![None; max_legs],
            exit_connections: vec![None; max_legs],
        }
    }

    /// Returns true if the target is reachable with some transfer budget.
    pub fn is_reachable(&self) -> bool {
        self.arrival_times.iter().any(Timestamp::is_finite)
    }

    /// Journey pointers for transfer budget `i`, if the target is reachable
    /// with it.
    pub fn pointers(&self, i: usize) -> Option<(&Arc<Connection>, &Arc<Connection>)> {
        if self.arrival_times.get(i)?.is_infinite() {
            return None;
        }
        let enter = self.enter_connections.get(i)?.as_ref()?;
        let exit = self.exit_connections.get(i)?.as_ref()?;
        Some((enter, exit))
    }

    /// Copy component `i` (value and pointers) from another entry.
    fn take_component(&mut self, other: &ProfileEntry, i: usize) {
        self.arrival_times[i] = other.arrival_times[i];
        self.enter_connections[i] = other.enter_connections[i].clone();
        self.exit_connections[i] = other.exit_connections[i].clone();
    }
}

/// Counters collected during one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    /// Connections read within the window.
    pub scanned: usize,
    /// Discarded for departing later than an earlier-read connection.
    pub out_of_order: usize,
    /// Discarded for not departing before they arrive.
    pub inconsistent: usize,
    /// Dominated at their departure stop.
    pub dominated: usize,
    /// Profile entries created or overwritten.
    pub entries_written: usize,
}

/// Result of a profile computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    target: StopId,
    max_legs: usize,
    /// Per stop, sorted by strictly decreasing departure time, unreachable
    /// entries removed.
    entries: HashMap<StopId, Vec<ProfileEntry>>,
    stats: ScanStats,
}

impl Profile {
    pub fn target(&self) -> &StopId {
        &self.target
    }

    pub fn max_legs(&self) -> usize {
        self.max_legs
    }

    /// Entries for a stop, latest departure first. Empty for unknown stops.
    pub fn entries(&self, stop: &StopId) -> &[ProfileEntry] {
        self.entries.get(stop).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All stops discovered during the scan.
    pub fn stops(&self) -> impl Iterator<Item = &StopId> {
        self.entries.keys()
    }

    pub fn contains_stop(&self, stop: &StopId) -> bool {
        self.entries.contains_key(stop)
    }

    /// Total number of entries over all stops.
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns true if no stop can reach the target.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }
}

/// Per-trip running state for one transfer budget.
#[derive(Debug, Clone)]
struct TripStep {
    /// Connection to alight after.
    connection: Option<Arc<Connection>>,
    /// Best arrival at the target from staying on board.
    time: Timestamp,
}

impl Default for TripStep {
    fn default() -> Self {
        Self {
            connection: None,
            time: Timestamp::INFINITY,
        }
    }
}

/// The backward profile scan.
///
/// Owns its connection source and a per-run [`IsdCache`] over the distance
/// source. All scan state is reset at the start of each computation, so one
/// engine serves any number of sequential queries; concurrent queries need
/// separate engines.
#[derive(Debug)]
pub struct ProfileEngine<C, D> {
    connections: C,
    distances: IsdCache<D>,
    max_legs: usize,
    profiles: HashMap<StopId, Vec<ProfileEntry>>,
    trips: HashMap<TripId, Vec<TripStep>>,
    stats: ScanStats,
}

impl<C: ConnectionSource, D: DistanceSource> ProfileEngine<C, D> {
    pub fn new(connections: C, distances: D, enable_isd_cache: bool) -> Self {
        Self {
            connections,
            distances: IsdCache::new(distances, enable_isd_cache),
            max_legs: 0,
            profiles: HashMap::new(),
            trips: HashMap::new(),
            stats: ScanStats::default(),
        }
    }

    /// The raw (uncached) distance source.
    pub fn distances(&self) -> &D {
        self.distances.source()
    }

    pub fn connections_mut(&mut self) -> &mut C {
        &mut self.connections
    }

    /// Both sources at once, for running other scans between profiles.
    pub fn sources_mut(&mut self) -> (&mut C, &D) {
        (&mut self.connections, self.distances.source())
    }

    /// Distance cache usage of the last computation.
    pub fn cache_usage_report(&self) -> CacheUsageReport {
        self.distances.usage_report()
    }

    fn reset(&mut self, max_legs: usize) {
        self.max_legs = max_legs;
        self.profiles.clear();
        self.trips.clear();
        self.stats = ScanStats::default();
        self.distances.reset();
    }

    /// Compute the profile towards `target` from connections departing in
    /// `[lower, upper]`, allowing up to `max_legs` vehicle legs.
    ///
    /// Malformed connections are logged and skipped. An empty window or
    /// `max_legs == 0` yields an empty profile without reading the source.
    pub async fn calculate_profile(
        &mut self,
        target: &StopId,
        max_legs: usize,
        lower: Timestamp,
        upper: Timestamp,
    ) -> Result<Profile, SourceError> {
        self.reset(max_legs);

        let window = TimeWindow::new(lower, upper);
        if max_legs == 0 || window.is_empty() {
            debug!(%target, max_legs, %window, "nothing to scan");
            return Ok(self.take_profile(target));
        }

        self.connections.rescope(window, ScanOrder::Backward);
        let mut current_departure = Timestamp::INFINITY;

        while let Some(connection) = self.connections.next_connection().await? {
            if connection.departure_time < lower {
                break;
            }
            self.stats.scanned += 1;

            if connection.departure_time > current_departure {
                warn!(%connection, "connection not in order, discarded");
                self.stats.out_of_order += 1;
                continue;
            }
            if connection.validate().is_err() {
                warn!(%connection, "connection does not depart before it arrives, discarded");
                self.stats.inconsistent += 1;
                continue;
            }
            current_departure = connection.departure_time;

            self.discover(&connection);
            self.scan_connection(&connection, target).await?;
        }

        let profile = self.take_profile(target);
        debug!(
            %target,
            stops = profile.entries.len(),
            entries = profile.entry_count(),
            stats = ?profile.stats,
            "profile computed"
        );
        Ok(profile)
    }

    /// Register the stops and trip of an accepted connection.
    fn discover(&mut self, connection: &Connection) {
        let max_legs = self.max_legs;
        for stop in [&connection.departure_stop, &connection.arrival_stop] {
            self.profiles
                .entry(stop.clone())
                .or_insert_with(|| vec![ProfileEntry::sentinel(max_legs)]);
        }
        self.trips
            .entry(connection.trip.clone())
            .or_insert_with(|| vec![TripStep::default(); max_legs]);
    }

    async fn scan_connection(
        &mut self,
        connection: &Arc<Connection>,
        target: &StopId,
    ) -> Result<(), SourceError> {
        let tc = self.connection_vector(connection, target).await?;
        let exits = self.update_trip(connection, &tc);

        let reference = self
            .profiles
            .get(&connection.departure_stop)
            .and_then(|entries| {
                entry_index_at(entries, connection.departure_time).map(|i| entries[i].clone())
            })
            .unwrap_or_else(|| ProfileEntry::sentinel(self.max_legs));

        // Dominance is judged at the departure stop. A footpath candidate is
        // only offered for non-dominated connections, so a stop reached by
        // walking to a stop whose own best entry is itself a walk never gets
        // the chained walk: journeys needing two consecutive walks are not found.
        if dominates(&reference.arrival_times, &tc) {
            trace!(%connection, "dominated");
            self.stats.dominated += 1;
            return Ok(());
        }

        let isds = self
            .distances
            .distances_for_stop(&connection.departure_stop)
            .await?;
        for isd in isds.iter() {
            let stop = isd.other_end(&connection.departure_stop);
            let candidate = footpath_candidate(
                connection,
                &tc,
                &exits,
                &reference,
                connection.departure_time - isd.duration,
                stop == &connection.departure_stop,
            );
            self.incorporate(stop, candidate);
        }
        Ok(())
    }

    /// Best arrival per transfer budget when boarding `connection`.
    async fn connection_vector(
        &mut self,
        connection: &Connection,
        target: &StopId,
    ) -> Result<Vec<Timestamp>, SourceError> {
        let max_legs = self.max_legs;

        let alight = if &connection.arrival_stop == target {
            connection.arrival_time
        } else {
            let walk = self
                .distances
                .distance(&connection.arrival_stop, target)
                .await?;
            connection.arrival_time.add_distance(walk)
        };
        let walk = vec![alight; max_legs];

        let stay: Vec<Timestamp> = self
            .trips
            .get(&connection.trip)
            .map(|steps| steps.iter().map(|s| s.time).collect())
            .unwrap_or_else(|| infinity_vector(max_legs));

        let transfer = shift_vector(
            &self
                .profiles
                .get(&connection.arrival_stop)
                .map(|entries| eval_profile(entries, connection.arrival_time, max_legs))
                .unwrap_or_else(|| infinity_vector(max_legs)),
        );

        Ok(min_vector(&min_vector(&walk, &stay), &transfer))
    }

    /// Merge the connection vector into its trip and return, per transfer
    /// budget, the connection to alight after.
    fn update_trip(&mut self, connection: &Arc<Connection>, tc: &[Timestamp]) -> Vec<Arc<Connection>> {
        let max_legs = self.max_legs;
        let steps = self
            .trips
            .entry(connection.trip.clone())
            .or_insert_with(|| vec![TripStep::default(); max_legs]);

        steps
            .iter_mut()
            .zip(tc)
            .map(|(step, &time)| {
                if time < step.time {
                    *step = TripStep {
                        connection: Some(Arc::clone(connection)),
                        time,
                    };
                }
                step.connection
                    .clone()
                    .unwrap_or_else(|| Arc::clone(connection))
            })
            .collect()
    }

    /// Fold a candidate entry into a stop's profile.
    fn incorporate(&mut self, stop: &StopId, candidate: ProfileEntry) {
        let max_legs = self.max_legs;
        let entries = self
            .profiles
            .entry(stop.clone())
            .or_insert_with(|| vec![ProfileEntry::sentinel(max_legs)]);

        let Some(r) = entry_index_at(entries, candidate.departure_time) else {
            return;
        };
        let reference = &entries[r];
        if dominates(&reference.arrival_times, &candidate.arrival_times) {
            return;
        }

        let mut merged = candidate;
        for i in 0..max_legs {
            if reference.arrival_times[i] <= merged.arrival_times[i] {
                merged.take_component(reference, i);
            }
        }

        let position = if reference.departure_time == merged.departure_time {
            entries[r] = merged;
            r
        } else {
            entries.insert(r + 1, merged);
            r + 1
        };

        // Entries departing earlier must stay at least as good.
        let (head, tail) = entries.split_at_mut(position + 1);
        let written = &head[position];
        for earlier in tail {
            for i in 0..max_legs {
                if written.arrival_times[i] < earlier.arrival_times[i] {
                    earlier.take_component(written, i);
                }
            }
        }

        trace!(%stop, departure = ?written.departure_time, "profile entry written");
        self.stats.entries_written += 1;
    }

    fn take_profile(&mut self, target: &StopId) -> Profile {
        self.trips.clear();
        let entries = std::mem::take(&mut self.profiles)
            .into_iter()
            .map(|(stop, entries)| {
                let reachable = entries
                    .into_iter()
                    .filter(ProfileEntry::is_reachable)
                    .collect();
                (stop, reachable)
            })
            .collect();

        Profile {
            target: target.clone(),
            max_legs: self.max_legs,
            entries,
            stats: self.stats,
        }
    }
}

/// The entry a connection contributes at the near end of one of its
/// footpaths, departing at `departure`.
///
/// Each component is the minimum of the connection vector and the departure
/// stop's reference entry, except that the reference is only borrowed where
/// its journey boards at the departure stop itself (or the footpath is the
/// stop's own transfer), so the walk can be replayed.
fn footpath_candidate(
    connection: &Arc<Connection>,
    tc: &[Timestamp],
    exits: &[Arc<Connection>],
    reference: &ProfileEntry,
    departure: Timestamp,
    same_stop: bool,
) -> ProfileEntry {
    let max_legs = tc.len();
    let mut candidate = ProfileEntry {
        departure_time: departure,
        arrival_times: tc.to_vec(),
        enter_connections: vec![Some(Arc::clone(connection)); max_legs],
        exit_connections: exits.iter().cloned().map(Some).collect(),
    };

    for i in 0..max_legs {
        let boards_here = same_stop
            || reference.enter_connections[i]
                .as_ref()
                .is_some_and(|enter| enter.departure_stop == connection.departure_stop);
        if boards_here && reference.arrival_times[i] < tc[i] {
            candidate.take_component(reference, i);
        }
    }

    // A larger budget may always fall back on a smaller one.
    for i in 1..max_legs {
        if candidate.arrival_times[i] > candidate.arrival_times[i - 1] {
            candidate.arrival_times[i] = candidate.arrival_times[i - 1];
            candidate.enter_connections[i] = candidate.enter_connections[i - 1].clone();
            candidate.exit_connections[i] = candidate.exit_connections[i - 1].clone();
        }
    }

    candidate
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
