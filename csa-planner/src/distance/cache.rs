//! Memoization of interstop-distance queries.
//!
//! Pairwise queries and per-stop queries are cached separately: a per-stop
//! result can't be answered from a partial set of pairwise entries. The cache
//! lives for one profile computation and is cleared by [`IsdCache::reset`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tracing::{trace, warn};

use crate::connections::SourceError;
use crate::domain::StopId;

use super::{DistanceSource, Isd};

/// Hit/miss counters for one kind of query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallCounts {
    /// Answered from the cache.
    pub cached: u64,
    /// Forwarded to the underlying source.
    pub uncached: u64,
}

/// Cache usage since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheUsageReport {
    pub enabled: bool,
    /// Pairwise `distance` queries.
    pub isd: CallCounts,
    /// `distances_for_stop` queries.
    pub isd_for_stop: CallCounts,
}

/// Order-independent key for a stop pair.
type PairKey = (StopId, StopId);

fn pair_key(a: &StopId, b: &StopId) -> PairKey {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Distance source wrapper with optional memoization.
///
/// When disabled every query goes straight to the wrapped source and no
/// counters are kept.
#[derive(Debug)]
pub struct IsdCache<D> {
    source: D,
    enabled: bool,

    /// Resolved pairwise queries; (a, b) and (b, a) share one entry.
    pairs: HashMap<PairKey, Option<Duration>>,

    /// All ISDs incident to a stop.
    per_stop: HashMap<StopId, Arc<[Isd]>>,

    isd_calls: CallCounts,
    isd_for_stop_calls: CallCounts,
}

impl<D: DistanceSource> IsdCache<D> {
    /// Wrap a distance source.
    pub fn new(source: D, enabled: bool) -> Self {
        Self {
            source,
            enabled,
            pairs: HashMap::new(),
            per_stop: HashMap::new(),
            isd_calls: CallCounts::default(),
            isd_for_stop_calls: CallCounts::default(),
        }
    }

    /// Access the wrapped source, bypassing the cache.
    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Forget all cached results and zero the counters.
    pub fn reset(&mut self) {
        self.pairs.clear();
        self.per_stop.clear();
        self.isd_calls = CallCounts::default();
        self.isd_for_stop_calls = CallCounts::default();
    }

    /// Walking duration between two stops, `None` if unreachable.
    pub async fn distance(
        &mut self,
        a: &StopId,
        b: &StopId,
    ) -> Result<Option<Duration>, SourceError> {
        if !self.enabled {
            return self.source.distance(a, b).await;
        }

        let key = pair_key(a, b);
        if let Some(duration) = self.pairs.get(&key) {
            self.isd_calls.cached += 1;
            trace!(%a, %b, "ISD cache hit");
            return Ok(*duration);
        }

        let duration = self.source.distance(a, b).await?;
        self.pairs.insert(key, duration);
        self.isd_calls.uncached += 1;
        Ok(duration)
    }

    /// All ISDs incident to `stop`.
    pub async fn distances_for_stop(&mut self, stop: &StopId) -> Result<Arc<[Isd]>, SourceError> {
        if !self.enabled {
            return Ok(self.source.distances_for_stop(stop).await?.into());
        }

        if let Some(isds) = self.per_stop.get(stop) {
            self.isd_for_stop_calls.cached += 1;
            trace!(%stop, "ISD-for-stop cache hit");
            return Ok(Arc::clone(isds));
        }

        let isds: Arc<[Isd]> = self.source.distances_for_stop(stop).await?.into();
        self.per_stop.insert(stop.clone(), Arc::clone(&isds));
        self.isd_for_stop_calls.uncached += 1;
        Ok(isds)
    }

    /// Report cache usage since the last reset.
    ///
    /// Asking while caching is disabled is allowed but only yields zeroes,
    /// and logs a warning.
    pub fn usage_report(&self) -> CacheUsageReport {
        if !self.enabled {
            warn!("ISD caches were not enabled");
        }
        CacheUsageReport {
            enabled: self.enabled,
            isd: self.isd_calls,
            isd_for_stop: self.isd_for_stop_calls,
        }
    }
}
