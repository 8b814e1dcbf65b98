//! Configuration for the journey planner.

use chrono::Duration;

/// Configuration parameters for profile computation.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Length of arrival vectors: index `i` allows `i` transfers, so this is
    /// the maximum number of vehicle legs in a journey.
    pub max_legs: usize,

    /// Memoize distance lookups during a profile computation.
    pub enable_isd_cache: bool,

    /// Scan horizon after the requested departure time (minutes).
    /// Also the fallback upper bound when the target looks unreachable.
    pub bound_horizon_mins: i64,

    /// Multiplier applied to the estimated earliest-arrival gap when
    /// computing the scan upper bound.
    pub bound_slack_factor: i32,
}

impl PlannerConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        max_legs: usize,
        enable_isd_cache: bool,
        bound_horizon_mins: i64,
        bound_slack_factor: i32,
    ) -> Self {
        Self {
            max_legs,
            enable_isd_cache,
            bound_horizon_mins,
            bound_slack_factor,
        }
    }

    /// Returns the bound horizon as a Duration.
    pub fn bound_horizon(&self) -> Duration {
        Duration::minutes(self.bound_horizon_mins)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_legs: 5,
            enable_isd_cache: true,
            bound_horizon_mins: 360, // 6 hours
            bound_slack_factor: 2,
        }
    }
}
