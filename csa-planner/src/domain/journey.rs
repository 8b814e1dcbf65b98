//! Journey types.
//!
//! A `Journey` is an itinerary extracted from a computed profile: vehicle
//! legs, each possibly spanning several connections of the same trip,
//! joined by walking interlegs. Journeys own copies of the stops and times
//! they show; they never point back into the engine's state.

use chrono::Duration;
use serde::{Serialize, Serializer};

use super::{Connection, DomainError, StopId, Timestamp, TripId};

fn duration_secs<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(d.num_seconds())
}

/// A ride on a single trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub trip: TripId,
    pub departure_stop: StopId,
    pub departure_time: Timestamp,
    pub arrival_stop: StopId,
    pub arrival_time: Timestamp,
}

impl Leg {
    /// Build the leg that boards at `enter` and alights at the end of `exit`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the two connections belong to different trips or the
    /// ride would end before it starts.
    pub fn ride(enter: &Connection, exit: &Connection) -> Result<Self, DomainError> {
        if enter.trip != exit.trip {
            return Err(DomainError::InvalidSegment(
                "enter and exit connections belong to different trips",
            ));
        }
        if exit.arrival_time <= enter.departure_time {
            return Err(DomainError::InvalidSegment("exit arrives before enter departs"));
        }
        Ok(Self {
            trip: enter.trip.clone(),
            departure_stop: enter.departure_stop.clone(),
            departure_time: enter.departure_time,
            arrival_stop: exit.arrival_stop.clone(),
            arrival_time: exit.arrival_time,
        })
    }

    /// Time spent on board.
    pub fn duration(&self) -> Duration {
        self.arrival_time.signed_duration_since(self.departure_time)
    }
}

/// A walk (or same-stop change) between two legs.
///
/// `from == to` is a change at one stop that takes the stop's minimum change
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interleg {
    pub from: StopId,
    pub to: StopId,
    pub departure_time: Timestamp,
    pub arrival_time: Timestamp,
    #[serde(serialize_with = "duration_secs")]
    pub duration: Duration,
}

impl Interleg {
    /// Create a walk starting at `departure_time`.
    pub fn new(from: StopId, to: StopId, departure_time: Timestamp, duration: Duration) -> Self {
        Self {
            from,
            to,
            departure_time,
            arrival_time: departure_time + duration,
            duration,
        }
    }

    /// Returns true if this is a change at a single stop.
    pub fn is_change(&self) -> bool {
        self.from == self.to
    }
}

/// A segment of a journey: either a vehicle leg or an interleg.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Segment {
    Leg(Leg),
    Interleg(Interleg),
}

impl Segment {
    /// Returns the stop this segment starts from.
    pub fn origin(&self) -> &StopId {
        match self {
            Segment::Leg(leg) => &leg.departure_stop,
            Segment::Interleg(walk) => &walk.from,
        }
    }

    /// Returns the stop this segment ends at.
    pub fn destination(&self) -> &StopId {
        match self {
            Segment::Leg(leg) => &leg.arrival_stop,
            Segment::Interleg(walk) => &walk.to,
        }
    }

    pub fn departure_time(&self) -> Timestamp {
        match self {
            Segment::Leg(leg) => leg.departure_time,
            Segment::Interleg(walk) => walk.departure_time,
        }
    }

    pub fn arrival_time(&self) -> Timestamp {
        match self {
            Segment::Leg(leg) => leg.arrival_time,
            Segment::Interleg(walk) => walk.arrival_time,
        }
    }

    /// Returns true if this is a vehicle leg.
    pub fn is_leg(&self) -> bool {
        matches!(self, Segment::Leg(_))
    }

    /// Returns the leg if this is a vehicle segment.
    pub fn as_leg(&self) -> Option<&Leg> {
        match self {
            Segment::Leg(leg) => Some(leg),
            Segment::Interleg(_) => None,
        }
    }

    /// Returns the interleg if this is a walking segment.
    pub fn as_interleg(&self) -> Option<&Interleg> {
        match self {
            Segment::Leg(_) => None,
            Segment::Interleg(walk) => Some(walk),
        }
    }
}

/// A complete journey from source to target.
///
/// # Invariants
///
/// - At least one segment, and exactly `transfers + 1` legs
/// - Consecutive segments connect (destination of one = origin of next)
/// - No segment departs before the previous one arrives, and none arrives
///   before it departs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    departure_time: Timestamp,
    arrival_time: Timestamp,
    transfers: usize,
    segments: Vec<Segment>,
}

impl Journey {
    /// Construct a journey from its segments.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any invariant listed on [`Journey`] is violated.
    ///
    /// # Examples
    ///
    /// ```
    /// use csa_planner::domain::{Connection, Interleg, Journey, Leg, Segment, StopId, Timestamp, TripId};
    /// use chrono::{Duration, NaiveDate};
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    /// let a = StopId::parse("A").unwrap();
    /// let b = StopId::parse("B").unwrap();
    /// let c = StopId::parse("C").unwrap();
    ///
    /// let ride = Connection::new(
    ///     a,
    ///     Timestamp::parse_hhmm("08:00", date).unwrap(),
    ///     b.clone(),
    ///     Timestamp::parse_hhmm("08:30", date).unwrap(),
    ///     TripId::parse("T1").unwrap(),
    /// );
    /// let leg = Leg::ride(&ride, &ride).unwrap();
    /// let walk = Interleg::new(b, c, leg.arrival_time, Duration::minutes(5));
    ///
    /// let journey = Journey::new(vec![Segment::Leg(leg), Segment::Interleg(walk)], 0).unwrap();
    /// assert_eq!(journey.arrival_time().to_string(), "08:35");
    /// ```
    pub fn new(segments: Vec<Segment>, transfers: usize) -> Result<Self, DomainError> {
        let (first, last) = match (segments.first(), segments.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(DomainError::EmptyJourney),
        };

        for segment in &segments {
            if segment.departure_time().is_infinite() || segment.arrival_time().is_infinite() {
                return Err(DomainError::InvalidSegment("segment times must be finite"));
            }
            if segment.arrival_time() < segment.departure_time() {
                return Err(DomainError::InvalidSegment("arrival before departure"));
            }
        }

        for pair in segments.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.destination() != next.origin() {
                return Err(DomainError::StopsNotConnected(
                    prev.destination().clone(),
                    next.origin().clone(),
                ));
            }
            if next.departure_time() < prev.arrival_time() {
                return Err(DomainError::NegativeHop(next.origin().clone()));
            }
        }

        let legs = segments.iter().filter(|s| s.is_leg()).count();
        if legs != transfers + 1 {
            return Err(DomainError::TransferMismatch { legs, transfers });
        }

        Ok(Self {
            departure_time: first.departure_time(),
            arrival_time: last.arrival_time(),
            transfers,
            segments,
        })
    }

    /// Returns all segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the vehicle legs in order.
    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        self.segments.iter().filter_map(Segment::as_leg)
    }

    /// Returns the interlegs in order.
    pub fn interlegs(&self) -> impl Iterator<Item = &Interleg> {
        self.segments.iter().filter_map(Segment::as_interleg)
    }

    /// Returns the number of transfers (legs minus one).
    pub fn transfers(&self) -> usize {
        self.transfers
    }

    /// Returns the departure time of the first segment.
    pub fn departure_time(&self) -> Timestamp {
        self.departure_time
    }

    /// Returns the arrival time of the last segment.
    pub fn arrival_time(&self) -> Timestamp {
        self.arrival_time
    }

    /// Returns the total journey duration.
    pub fn duration(&self) -> Duration {
        self.arrival_time.signed_duration_since(self.departure_time)
    }

    /// Returns the stop the journey starts from.
    pub fn origin(&self) -> &StopId {
        // Non-empty by construction.
        self.segments[0].origin()
    }

    /// Returns the stop the journey ends at.
    pub fn destination(&self) -> &StopId {
        self.segments[self.segments.len() - 1].destination()
    }
}
