//! Distance source with no footpaths, only a uniform change time.

use chrono::Duration;

use crate::connections::SourceError;
use crate::domain::StopId;

use super::{DistanceSource, Isd};

/// Every stop is reachable only from itself, after a fixed change time.
///
/// Useful for networks without footpath data: transfers happen only within a
/// stop.
#[derive(Debug, Clone, Copy)]
pub struct ChangeTimeOnly {
    change_time: Duration,
}

impl ChangeTimeOnly {
    pub fn new(change_time: Duration) -> Self {
        Self { change_time }
    }

    pub fn change_time(&self) -> Duration {
        self.change_time
    }
}

impl Default for ChangeTimeOnly {
    fn default() -> Self {
        Self::new(Duration::zero())
    }
}

impl DistanceSource for ChangeTimeOnly {
    async fn distance(&self, a: &StopId, b: &StopId) -> Result<Option<Duration>, SourceError> {
        Ok((a == b).then_some(self.change_time))
    }

    async fn distances_for_stop(&self, stop: &StopId) -> Result<Vec<Isd>, SourceError> {
        Ok(vec![Isd::new(stop.clone(), stop.clone(), self.change_time)])
    }
}
