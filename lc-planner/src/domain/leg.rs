//! Route leg types.
//!
//! A `RouteLeg` is one vehicle boarding: the passenger gets on at the
//! departure end and off at the arrival end, riding every connection of the
//! trip in between. Connections are shared as `Arc<Connection>` so legs are
//! cheap to clone while routes are being ranked.

use std::sync::Arc;

use chrono::Duration;

use super::{
    Connection, ConnectionId, Delay, DomainError, RouteId, StationId, TransitTime, TripId,
};

/// The vehicle a leg is ridden on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    /// Trip URI
    pub trip: TripId,
    /// Route (line) URI
    pub route: RouteId,
    /// Headsign
    pub direction: String,
}

/// One end of a leg: where and when the passenger boards or alights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLegEnd {
    /// Connection boarded or alighted
    pub connection: ConnectionId,
    /// Station of the event
    pub station: StationId,
    /// Scheduled time of the event
    pub time: TransitTime,
    /// Delay on the event
    pub delay: Delay,
    /// Platform, when the source publishes one
    pub platform: Option<String>,
    /// Whether the stop is cancelled
    pub canceled: bool,
    /// Whether the event is already in the past
    pub passed: bool,
}

impl RouteLegEnd {
    /// The boarding end of a connection, as seen at `now`.
    pub fn departure_of(connection: &Connection, now: TransitTime) -> Self {
        Self {
            connection: connection.id.clone(),
            station: connection.departure_station.clone(),
            time: connection.departure_time,
            delay: connection.departure_delay,
            platform: None,
            canceled: false,
            passed: connection.departure_time < now,
        }
    }

    /// The alighting end of a connection, as seen at `now`.
    pub fn arrival_of(connection: &Connection, now: TransitTime) -> Self {
        Self {
            connection: connection.id.clone(),
            station: connection.arrival_station.clone(),
            time: connection.arrival_time,
            delay: connection.arrival_delay,
            platform: None,
            canceled: false,
            passed: connection.arrival_time < now,
        }
    }

    /// Expected time including delay.
    pub fn delayed_time(&self) -> TransitTime {
        self.time.delayed(self.delay)
    }
}

/// A leg of a route (one vehicle).
///
/// # Invariants
///
/// - At least one connection
/// - All connections belong to the same trip
/// - Consecutive connections are contiguous: each departs from the station
///   the previous one arrives at, no earlier than that arrival
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLeg {
    vehicle: Vehicle,
    departure: RouteLegEnd,
    arrival: RouteLegEnd,
    connections: Vec<Arc<Connection>>,
}

impl RouteLeg {
    /// Construct a leg from the connections ridden, in travel order.
    ///
    /// `now` decides the `passed` flags on both ends.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the connections are empty, span more than one trip,
    /// or do not follow each other.
    ///
    /// # Examples
    ///
    /// ```
    /// use lc_planner::domain::{
    ///     Connection, ConnectionId, RouteId, RouteLeg, StationId, TransitTime, TripId,
    /// };
    /// use chrono::NaiveDate;
    /// use std::sync::Arc;
    ///
    /// let date = NaiveDate::from_ymd_opt(2018, 8, 9).unwrap();
    /// let t = |s: &str| TransitTime::parse_hhmm(s, date).unwrap();
    ///
    /// let c = Arc::new(Connection::new(
    ///     ConnectionId::parse("c1").unwrap(),
    ///     StationId::parse("A").unwrap(),
    ///     StationId::parse("B").unwrap(),
    ///     t("10:00"),
    ///     t("10:20"),
    ///     TripId::parse("t1").unwrap(),
    ///     RouteId::parse("r1").unwrap(),
    /// ));
    ///
    /// let leg = RouteLeg::new(vec![c], t("09:00")).unwrap();
    /// assert_eq!(leg.departure_time().to_string(), "10:00");
    /// assert_eq!(leg.arrival_time().to_string(), "10:20");
    /// ```
    pub fn new(connections: Vec<Arc<Connection>>, now: TransitTime) -> Result<Self, DomainError> {
        let (first, last) = match (connections.first(), connections.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(DomainError::InvalidLeg("leg must ride at least one connection")),
        };

        for pair in connections.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.trip != next.trip {
                return Err(DomainError::InvalidLeg(
                    "all connections must belong to one trip",
                ));
            }
            if prev.arrival_station != next.departure_station {
                return Err(DomainError::InvalidLeg(
                    "connections must continue from the previous arrival station",
                ));
            }
            if next.departure_time < prev.arrival_time {
                return Err(DomainError::InvalidLeg(
                    "connection departs before the previous one arrives",
                ));
            }
        }

        let vehicle = Vehicle {
            trip: first.trip.clone(),
            route: first.route.clone(),
            direction: first.direction.clone(),
        };
        let departure = RouteLegEnd::departure_of(first, now);
        let arrival = RouteLegEnd::arrival_of(last, now);

        Ok(Self {
            vehicle,
            departure,
            arrival,
            connections,
        })
    }

    /// Returns the vehicle ridden.
    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    /// Returns the boarding end.
    pub fn departure(&self) -> &RouteLegEnd {
        &self.departure
    }

    /// Returns the alighting end.
    pub fn arrival(&self) -> &RouteLegEnd {
        &self.arrival
    }

    /// Returns the connections ridden, in travel order.
    pub fn connections(&self) -> &[Arc<Connection>] {
        &self.connections
    }

    /// Returns the boarding station.
    pub fn departure_station(&self) -> &StationId {
        &self.departure.station
    }

    /// Returns the alighting station.
    pub fn arrival_station(&self) -> &StationId {
        &self.arrival.station
    }

    /// Scheduled boarding time.
    pub fn departure_time(&self) -> TransitTime {
        self.departure.time
    }

    /// Scheduled alighting time.
    pub fn arrival_time(&self) -> TransitTime {
        self.arrival.time
    }

    /// Scheduled time on board.
    pub fn duration(&self) -> Duration {
        self.arrival.time.signed_duration_since(self.departure.time)
    }

    /// Expected time on board, with both delays applied.
    pub fn delayed_duration(&self) -> Duration {
        self.arrival
            .delayed_time()
            .signed_duration_since(self.departure.delayed_time())
    }

    /// Stations passed through without alighting.
    pub fn intermediate_stop_count(&self) -> usize {
        self.connections.len() - 1
    }

    /// Returns true if either end of the leg is cancelled.
    pub fn is_canceled(&self) -> bool {
        self.departure.canceled || self.arrival.canceled
    }
}
