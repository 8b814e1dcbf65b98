//! Footpath table: a static, symmetric set of walking links.
//!
//! Footpaths are stored in both directions for O(1) lookup. Every stop also
//! has a change time (the duration of its self-ISD), falling back to a table
//! default, so that a stop's own profile is always maintained by the scan.

use std::collections::{BTreeMap, HashMap};

use chrono::Duration;

use crate::connections::SourceError;
use crate::domain::StopId;

use super::{DistanceSource, Isd};

/// A collection of walkable links between stops.
///
/// Links are symmetric: if you can walk from A to B, you can walk from B to A
/// in the same time.
#[derive(Debug, Clone, Default)]
pub struct FootpathTable {
    /// Map from stop to its neighbours, with walk durations.
    /// Ordered so that `distances_for_stop` is deterministic.
    neighbours: HashMap<StopId, BTreeMap<StopId, Duration>>,

    /// Per-stop minimum change times.
    change_times: HashMap<StopId, Duration>,

    /// Change time for stops without their own.
    default_change_time: Duration,
}

impl FootpathTable {
    /// Create an empty table with a zero default change time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the change time used for stops without their own.
    pub fn with_default_change_time(mut self, change_time: Duration) -> Self {
        self.default_change_time = change_time;
        self
    }

    /// Add a footpath between two stops.
    ///
    /// The footpath is stored symmetrically. A footpath from a stop to itself
    /// sets that stop's change time.
    pub fn add(&mut self, a: StopId, b: StopId, duration: Duration) {
        if a == b {
            self.change_times.insert(a, duration);
            return;
        }
        self.neighbours
            .entry(a.clone())
            .or_default()
            .insert(b.clone(), duration);
        self.neighbours.entry(b).or_default().insert(a, duration);
    }

    /// Set the minimum change time at one stop.
    pub fn set_change_time(&mut self, stop: StopId, change_time: Duration) {
        self.change_times.insert(stop, change_time);
    }

    /// Returns the change time at a stop.
    pub fn change_time(&self, stop: &StopId) -> Duration {
        self.change_times
            .get(stop)
            .copied()
            .unwrap_or(self.default_change_time)
    }

    /// Get the walk duration between two stops.
    ///
    /// Returns the change time for `a == b`, and `None` if the stops are not
    /// linked.
    pub fn get(&self, a: &StopId, b: &StopId) -> Option<Duration> {
        if a == b {
            return Some(self.change_time(a));
        }
        self.neighbours.get(a)?.get(b).copied()
    }

    /// Get all stops walkable from a given stop (excluding itself).
    pub fn walkable_from(&self, stop: &StopId) -> Vec<(StopId, Duration)> {
        self.neighbours
            .get(stop)
            .map(|n| n.iter().map(|(s, d)| (s.clone(), *d)).collect())
            .unwrap_or_default()
    }

    /// Returns the number of footpaths (counting A-B and B-A as one).
    pub fn len(&self) -> usize {
        self.neighbours.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    /// Returns true if there are no footpaths between distinct stops.
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }
}

impl DistanceSource for FootpathTable {
    async fn distance(&self, a: &StopId, b: &StopId) -> Result<Option<Duration>, SourceError> {
        Ok(self.get(a, b))
    }

    async fn distances_for_stop(&self, stop: &StopId) -> Result<Vec<Isd>, SourceError> {
        let mut isds = vec![Isd::new(stop.clone(), stop.clone(), self.change_time(stop))];
        isds.extend(
            self.walkable_from(stop)
                .into_iter()
                .map(|(other, duration)| Isd::new(stop.clone(), other, duration)),
        );
        Ok(isds)
    }
}

/// Builder for footpath tables.
///
/// Provides a fluent API for adding footpaths. Invalid stop identifiers and
/// out-of-range durations are ignored.
#[derive(Debug, Default)]
pub struct FootpathTableBuilder {
    inner: FootpathTable,
}

impl FootpathTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a footpath, duration in seconds.
    pub fn add(mut self, a: &str, b: &str, duration_secs: i64) -> Self {
        if let (Ok(a), Ok(b), Some(duration)) = (
            StopId::parse(a),
            StopId::parse(b),
            Duration::try_seconds(duration_secs),
        ) {
            self.inner.add(a, b, duration);
        }
        self
    }

    /// Set a stop's change time, in seconds.
    pub fn change_time(mut self, stop: &str, duration_secs: i64) -> Self {
        if let (Ok(stop), Some(duration)) =
            (StopId::parse(stop), Duration::try_seconds(duration_secs))
        {
            self.inner.set_change_time(stop, duration);
        }
        self
    }

    /// Set the default change time, in seconds.
    pub fn default_change_time(mut self, duration_secs: i64) -> Self {
        if let Some(duration) = Duration::try_seconds(duration_secs) {
            self.inner.default_change_time = duration;
        }
        self
    }

    pub fn build(self) -> FootpathTable {
        self.inner
    }
}
