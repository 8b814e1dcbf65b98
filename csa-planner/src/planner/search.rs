//! Journey queries: bounds, then profile, then extraction.

use tracing::info;

use crate::connections::{ConnectionSource, SourceError};
use crate::distance::{CacheUsageReport, DistanceSource};
use crate::domain::{Journey, StopId, Timestamp};

use super::bounds::{BoundsCalculator, EarliestArrivalHeuristic, TimeBounds};
use super::config::PlannerConfig;
use super::extract::JourneyExtractor;
use super::profile::{Profile, ProfileEngine, ScanStats};

/// Error from journey planning.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// A connection or distance source failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Invalid query
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Journey pointers could not be replayed; the profile is corrupt
    #[error("inconsistent profile at {stop}: {message}")]
    Inconsistent { stop: StopId, message: String },
}

/// Request for journeys between two stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyRequest {
    pub source: StopId,
    pub target: StopId,

    /// Earliest acceptable departure from `source`.
    pub departure_time: Timestamp,

    /// Overrides the configured maximum number of vehicle legs.
    pub max_legs: Option<usize>,
}

impl JourneyRequest {
    pub fn new(source: StopId, target: StopId, departure_time: Timestamp) -> Self {
        Self {
            source,
            target,
            departure_time,
            max_legs: None,
        }
    }

    pub fn with_max_legs(mut self, max_legs: usize) -> Self {
        self.max_legs = Some(max_legs);
        self
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.departure_time.is_infinite() {
            return Err(PlannerError::InvalidRequest(
                "departure time must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a journey query.
#[derive(Debug, Clone)]
pub struct JourneyResult {
    /// Pareto-optimal journeys, latest departure first.
    pub journeys: Vec<Journey>,

    /// Window the profile was computed over.
    pub bounds: TimeBounds,

    /// Counters of the scan that produced the profile.
    pub stats: ScanStats,

    /// True if the previous profile was reused without scanning.
    pub reused_profile: bool,
}

/// The query parameters a profile depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProfileMetadata {
    target: StopId,
    departure_time: Timestamp,
    max_legs: usize,
}

#[derive(Debug)]
struct ComputedProfile {
    metadata: ProfileMetadata,
    bounds: TimeBounds,
    profile: Profile,
}

/// Journey planner.
///
/// Wires a bounds calculator, the profile engine and the journey extractor
/// together. The last profile is kept and reused when a query repeats its
/// target, departure time and leg limit; the source does not matter because
/// a profile covers every stop.
#[derive(Debug)]
pub struct Planner<C, D, B = EarliestArrivalHeuristic> {
    engine: ProfileEngine<C, D>,
    bounds: B,
    config: PlannerConfig,
    last: Option<ComputedProfile>,
}

impl<C: ConnectionSource, D: DistanceSource> Planner<C, D> {
    /// Create a planner bounded by the earliest-arrival heuristic.
    pub fn new(connections: C, distances: D, config: PlannerConfig) -> Self {
        let bounds = EarliestArrivalHeuristic::from_config(&config);
        Self::with_bounds(connections, distances, bounds, config)
    }
}

impl<C: ConnectionSource, D: DistanceSource, B: BoundsCalculator> Planner<C, D, B> {
    pub fn with_bounds(connections: C, distances: D, bounds: B, config: PlannerConfig) -> Self {
        Self {
            engine: ProfileEngine::new(connections, distances, config.enable_isd_cache),
            bounds,
            config,
            last: None,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The most recently computed profile.
    pub fn profile(&self) -> Option<&Profile> {
        self.last.as_ref().map(|c| &c.profile)
    }

    /// Distance cache usage of the last profile computation.
    pub fn cache_usage_report(&self) -> CacheUsageReport {
        self.engine.cache_usage_report()
    }

    /// Find journeys, reusing the last profile when possible.
    pub async fn journeys(&mut self, request: &JourneyRequest) -> Result<JourneyResult, PlannerError> {
        self.run(request, false).await
    }

    /// Find journeys, always computing a fresh profile.
    pub async fn journeys_recalculated(
        &mut self,
        request: &JourneyRequest,
    ) -> Result<JourneyResult, PlannerError> {
        self.run(request, true).await
    }

    async fn run(
        &mut self,
        request: &JourneyRequest,
        recalculate: bool,
    ) -> Result<JourneyResult, PlannerError> {
        request.validate()?;

        let metadata = ProfileMetadata {
            target: request.target.clone(),
            departure_time: request.departure_time,
            max_legs: request.max_legs.unwrap_or(self.config.max_legs),
        };

        let (computed, reused_profile) = match self.last.take() {
            Some(last) if !recalculate && last.metadata == metadata => (last, true),
            _ => (self.compute(&request.source, metadata).await?, false),
        };

        let journeys = JourneyExtractor::new(self.engine.distances())
            .extract_journeys(
                &computed.profile,
                &request.source,
                &request.target,
                request.departure_time,
            )
            .await;

        let result = journeys.map(|journeys| JourneyResult {
            journeys,
            bounds: computed.bounds,
            stats: computed.profile.stats(),
            reused_profile,
        });
        self.last = Some(computed);

        if let Ok(result) = &result {
            info!(
                source = %request.source,
                target = %request.target,
                journeys = result.journeys.len(),
                reused_profile,
                "journey query answered"
            );
        }
        result
    }

    async fn compute(
        &mut self,
        source: &StopId,
        metadata: ProfileMetadata,
    ) -> Result<ComputedProfile, PlannerError> {
        let (connections, distances) = self.engine.sources_mut();
        let bounds = self
            .bounds
            .calculate_bounds(
                connections,
                distances,
                source,
                metadata.departure_time,
                &metadata.target,
            )
            .await?;

        let profile = self
            .engine
            .calculate_profile(&metadata.target, metadata.max_legs, bounds.lower, bounds.upper)
            .await?;

        Ok(ComputedProfile {
            metadata,
            bounds,
            profile,
        })
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
