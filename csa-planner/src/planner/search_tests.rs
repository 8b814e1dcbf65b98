//! Unit tests for the journey planner façade.

use super::*;
use crate::connections::StaticConnections;
use crate::dataset::Dataset;
use crate::distance::{FootpathTable, FootpathTableBuilder};
use crate::domain::{Connection, Segment, TripId};
use crate::planner::FixedHorizon;

fn stop(s: &str) -> StopId {
    StopId::parse(s).unwrap()
}

fn time(s: &str) -> Timestamp {
    Timestamp::parse_rfc3339(&format!("2024-03-15T{s}:00Z")).unwrap()
}

fn conn(from: &str, dep: &str, to: &str, arr: &str, trip: &str) -> Connection {
    Connection::new(
        stop(from),
        time(dep),
        stop(to),
        time(arr),
        TripId::parse(trip).unwrap(),
    )
}

/// A -> B on T1, then a 5 minute walk from B to C.
fn walk_at_end() -> (StaticConnections, FootpathTable) {
    let connections = StaticConnections::new(vec![conn("A", "08:00", "B", "08:30", "T1")]);
    let footpaths = FootpathTableBuilder::new().add("B", "C", 300).build();
    (connections, footpaths)
}

/// A -> B on T1, change at B (5 min), B -> C on T2. A slow direct T3 too.
fn one_change() -> (StaticConnections, FootpathTable) {
    let connections = StaticConnections::new(vec![
        conn("A", "08:00", "B", "08:30", "T1"),
        conn("B", "08:40", "C", "09:00", "T2"),
        conn("A", "08:05", "C", "09:30", "T3"),
    ]);
    let footpaths = FootpathTableBuilder::new().change_time("B", 300).build();
    (connections, footpaths)
}

#[tokio::test]
async fn leg_then_walk_to_target() {
    let (connections, footpaths) = walk_at_end();
    let mut planner = Planner::new(connections, footpaths, PlannerConfig::default());

    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00")).with_max_legs(1);
    let result = planner.journeys(&request).await.unwrap();

    assert_eq!(result.journeys.len(), 1);
    let journey = &result.journeys[0];
    assert_eq!(journey.transfers(), 0);
    assert_eq!(journey.departure_time(), time("08:00"));
    assert_eq!(journey.arrival_time(), time("08:35"));

    let segments = journey.segments();
    assert_eq!(segments.len(), 2);
    let Segment::Leg(leg) = &segments[0] else {
        panic!("expected a leg first");
    };
    assert_eq!(leg.trip.as_str(), "T1");
    assert_eq!(leg.arrival_stop, stop("B"));
    assert_eq!(leg.arrival_time, time("08:30"));
    let Segment::Interleg(walk) = &segments[1] else {
        panic!("expected a walk second");
    };
    assert_eq!(walk.from, stop("B"));
    assert_eq!(walk.to, stop("C"));
    assert_eq!(walk.arrival_time, time("08:35"));
}

#[tokio::test]
async fn one_change_journey_found() {
    let (connections, footpaths) = one_change();
    let mut planner = Planner::new(connections, footpaths, PlannerConfig::default());

    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00")).with_max_legs(2);
    let result = planner.journeys(&request).await.unwrap();

    let fastest = result
        .journeys
        .iter()
        .min_by_key(|j| j.arrival_time())
        .unwrap();
    assert_eq!(fastest.transfers(), 1);
    assert_eq!(fastest.arrival_time(), time("09:00"));
    assert_eq!(fastest.legs().count(), 2);

    let change = fastest.interlegs().next().unwrap();
    assert!(change.is_change());
    assert_eq!(change.from, stop("B"));
    assert_eq!(change.duration, chrono::Duration::minutes(5));

    // The direct train leaves later, so it is a separate Pareto option.
    assert!(
        result
            .journeys
            .iter()
            .any(|j| j.transfers() == 0 && j.arrival_time() == time("09:30"))
    );
}

#[tokio::test]
async fn more_legs_never_hurt() {
    let request = |legs| JourneyRequest::new(stop("A"), stop("C"), time("08:00")).with_max_legs(legs);

    let mut best = Vec::new();
    for legs in 0..=3 {
        let (connections, footpaths) = one_change();
        let mut planner = Planner::new(connections, footpaths, PlannerConfig::default());
        let result = planner.journeys(&request(legs)).await.unwrap();
        best.push(
            result
                .journeys
                .iter()
                .map(|j| j.arrival_time())
                .min()
                .unwrap_or(Timestamp::INFINITY),
        );
    }

    assert_eq!(best[0], Timestamp::INFINITY);
    assert_eq!(best[1], time("09:30"));
    assert_eq!(best[2], time("09:00"));
    assert_eq!(best[3], time("09:00"));
}

#[tokio::test]
async fn zero_legs_finds_nothing() {
    let (connections, footpaths) = walk_at_end();
    let mut planner = Planner::new(connections, footpaths, PlannerConfig::default());

    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00")).with_max_legs(0);
    let result = planner.journeys(&request).await.unwrap();

    assert!(result.journeys.is_empty());
    assert_eq!(result.stats.scanned, 0);
}

#[tokio::test]
async fn repeated_query_reuses_profile() {
    let (connections, footpaths) = walk_at_end();
    let mut planner = Planner::new(connections, footpaths, PlannerConfig::default());
    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00"));

    let first = planner.journeys(&request).await.unwrap();
    assert!(!first.reused_profile);

    let second = planner.journeys(&request).await.unwrap();
    assert!(second.reused_profile);
    assert_eq!(first.journeys, second.journeys);

    let forced = planner.journeys_recalculated(&request).await.unwrap();
    assert!(!forced.reused_profile);
    assert_eq!(first.journeys, forced.journeys);
}

#[tokio::test]
async fn profile_is_reused_for_other_sources() {
    let connections = StaticConnections::new(vec![
        conn("A", "08:00", "B", "08:30", "T1"),
        conn("B", "08:40", "C", "09:00", "T1"),
    ]);
    let mut planner = Planner::with_bounds(
        connections,
        FootpathTable::new(),
        FixedHorizon::new(chrono::Duration::hours(6)),
        PlannerConfig::default(),
    );

    let from_a = JourneyRequest::new(stop("A"), stop("C"), time("08:00"));
    planner.journeys(&from_a).await.unwrap();

    let from_b = JourneyRequest::new(stop("B"), stop("C"), time("08:00"));
    let result = planner.journeys(&from_b).await.unwrap();
    assert!(result.reused_profile);
    assert_eq!(result.journeys.len(), 1);
    assert_eq!(result.journeys[0].origin(), &stop("B"));
}

#[tokio::test]
async fn changed_query_recomputes() {
    let (connections, footpaths) = walk_at_end();
    let mut planner = Planner::new(connections, footpaths, PlannerConfig::default());

    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00"));
    planner.journeys(&request).await.unwrap();

    let later = JourneyRequest::new(stop("A"), stop("C"), time("08:01"));
    let result = planner.journeys(&later).await.unwrap();
    assert!(!result.reused_profile);
    assert!(result.journeys.is_empty());

    let fewer_legs = request.clone().with_max_legs(2);
    let result = planner.journeys(&fewer_legs).await.unwrap();
    assert!(!result.reused_profile);
}

#[tokio::test]
async fn bounds_come_from_the_heuristic() {
    let (connections, footpaths) = walk_at_end();
    let mut planner = Planner::new(connections, footpaths, PlannerConfig::default());

    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00"));
    let result = planner.journeys(&request).await.unwrap();

    // Earliest arrival 08:35, doubled gap.
    assert_eq!(result.bounds.lower, time("08:00"));
    assert_eq!(result.bounds.upper, time("09:10"));
}

#[tokio::test]
async fn cache_usage_is_reported() {
    let (connections, footpaths) = one_change();
    let mut planner = Planner::new(connections, footpaths, PlannerConfig::default());
    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00"));
    planner.journeys(&request).await.unwrap();

    let report = planner.cache_usage_report();
    assert!(report.enabled);
    assert!(report.isd.uncached > 0);
    assert!(report.isd_for_stop.uncached > 0);
}

#[tokio::test]
async fn disabled_cache_reports_zeroes() {
    let (connections, footpaths) = one_change();
    let config = PlannerConfig {
        enable_isd_cache: false,
        ..PlannerConfig::default()
    };
    let mut planner = Planner::new(connections, footpaths, config);
    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00"));
    let result = planner.journeys(&request).await.unwrap();
    assert!(!result.journeys.is_empty());

    let report = planner.cache_usage_report();
    assert!(!report.enabled);
    assert_eq!(report.isd.cached + report.isd.uncached, 0);
}

#[tokio::test]
async fn infinite_departure_is_rejected() {
    let (connections, footpaths) = walk_at_end();
    let mut planner = Planner::new(connections, footpaths, PlannerConfig::default());

    let request = JourneyRequest::new(stop("A"), stop("C"), Timestamp::INFINITY);
    assert!(matches!(
        planner.journeys(&request).await,
        Err(PlannerError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn empty_timetable_has_no_journeys() {
    let mut planner = Planner::new(
        StaticConnections::new(vec![]),
        FootpathTable::new(),
        PlannerConfig::default(),
    );

    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00"));
    let result = planner.journeys(&request).await.unwrap();

    assert!(result.journeys.is_empty());
    assert!(planner.profile().unwrap().is_empty());
}

#[tokio::test]
async fn connection_without_arrival_is_skipped() {
    let dataset = Dataset::from_json(
        r#"{
        "connections": [
            { "departureStop": "A", "departureTime": "2024-03-15T08:00:00Z",
              "arrivalStop": "C", "arrivalTime": null, "tripId": "T1" },
            { "departureStop": "A", "departureTime": "2024-03-15T08:10:00Z",
              "arrivalStop": "C", "arrivalTime": "2024-03-15T08:40:00Z", "tripId": "T2" }
        ]
    }"#,
    )
    .unwrap();
    let mut planner = Planner::new(
        dataset.connections,
        dataset.footpaths,
        PlannerConfig::default(),
    );

    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00")).with_max_legs(1);
    let result = planner.journeys(&request).await.unwrap();

    assert_eq!(result.journeys.len(), 1);
    assert_eq!(result.journeys[0].departure_time(), time("08:10"));
    assert_eq!(result.journeys[0].arrival_time(), time("08:40"));
    assert!(result.bounds.upper.is_finite());
}

#[tokio::test]
async fn departure_at_query_time_despite_change_time() {
    let dataset = Dataset::from_json(
        r#"{
        "changeTime": 60,
        "connections": [
            { "departureStop": "A", "departureTime": "2024-03-15T08:00:00Z",
              "arrivalStop": "B", "arrivalTime": "2024-03-15T08:30:00Z", "tripId": "T1" }
        ],
        "footpaths": [ { "stop1": "B", "stop2": "C", "duration": 300 } ]
    }"#,
    )
    .unwrap();
    let mut planner = Planner::new(
        dataset.connections,
        dataset.footpaths,
        PlannerConfig::default(),
    );

    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00")).with_max_legs(1);
    let result = planner.journeys(&request).await.unwrap();

    assert_eq!(result.journeys.len(), 1);
    assert_eq!(result.journeys[0].departure_time(), time("08:00"));
    assert_eq!(result.journeys[0].arrival_time(), time("08:35"));

    let later = JourneyRequest::new(stop("A"), stop("C"), time("08:01")).with_max_legs(1);
    assert!(planner.journeys(&later).await.unwrap().journeys.is_empty());
}

#[tokio::test]
async fn identical_journeys_are_reported_once() {
    let (connections, footpaths) = one_change();
    let mut planner = Planner::new(connections, footpaths, PlannerConfig::default());

    let request = JourneyRequest::new(stop("A"), stop("C"), time("08:00")).with_max_legs(3);
    let journeys = planner.journeys(&request).await.unwrap().journeys;

    assert!(!journeys.is_empty());
    for (i, a) in journeys.iter().enumerate() {
        assert!(journeys[i + 1..].iter().all(|b| a != b), "duplicate {a:?}");
    }
}
