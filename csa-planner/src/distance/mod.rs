//! Interstop distances ("footpaths").
//!
//! An interstop distance (ISD) is an undirected walking or transfer link
//! between two stops. A self-referencing ISD (`stop1 == stop2`) carries the
//! minimum change time at that stop. Sources are injected into the planner
//! through [`DistanceSource`]; [`IsdCache`] memoizes one for the duration of a
//! profile computation.

mod cache;
mod change_time;
mod table;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::connections::SourceError;
use crate::domain::StopId;

pub use cache::{CacheUsageReport, CallCounts, IsdCache};
pub use change_time::ChangeTimeOnly;
pub use table::{FootpathTable, FootpathTableBuilder};

/// An undirected interstop distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Isd {
    pub stop1: StopId,
    pub stop2: StopId,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl Isd {
    pub fn new(stop1: StopId, stop2: StopId, duration: Duration) -> Self {
        Self {
            stop1,
            stop2,
            duration,
        }
    }

    /// Returns the endpoint that is not `stop`.
    ///
    /// For a self-referencing ISD this is `stop` itself.
    pub fn other_end(&self, stop: &StopId) -> &StopId {
        if &self.stop1 == stop {
            &self.stop2
        } else {
            &self.stop1
        }
    }

    /// Returns true if this ISD links `a` and `b`, in either order.
    pub fn links(&self, a: &StopId, b: &StopId) -> bool {
        (&self.stop1 == a && &self.stop2 == b) || (&self.stop1 == b && &self.stop2 == a)
    }
}

/// Capability for looking up walking/transfer durations.
///
/// Implementations may be table lookups or remote services, hence async and
/// fallible.
pub trait DistanceSource {
    /// Walking duration between two stops, `None` if there is no footpath.
    ///
    /// Symmetric: `distance(a, b) == distance(b, a)`.
    async fn distance(&self, a: &StopId, b: &StopId) -> Result<Option<Duration>, SourceError>;

    /// All ISDs incident to `stop`, including its self-ISD if it has one.
    async fn distances_for_stop(&self, stop: &StopId) -> Result<Vec<Isd>, SourceError>;
}

/// Serde helper: durations as whole seconds.
pub(crate) mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        if secs < 0 {
            return Err(serde::de::Error::custom("duration must not be negative"));
        }
        Duration::try_seconds(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("duration {secs}s out of range")))
    }
}
