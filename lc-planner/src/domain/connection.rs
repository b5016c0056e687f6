//! Timetable connections.
//!
//! A connection is the atom of a Linked Connections timetable: one vehicle
//! departing one station and arriving at the next, with no stop in between.

use chrono::Duration;

use super::{ConnectionId, Delay, RouteId, StationId, TransitTime, TripId};

/// GTFS pickup/drop-off type.
///
/// Only `NotAvailable` forbids boarding or alighting; the other non-regular
/// types are allowed but cannot be relied on for the first boarding or the
/// final alighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GtfsType {
    /// Regularly scheduled pickup or drop-off.
    #[default]
    Regular,
    /// No pickup or drop-off available.
    NotAvailable,
    /// Must phone the agency to arrange it.
    MustPhone,
    /// Must coordinate with the driver.
    MustCoordinateWithDriver,
}

impl GtfsType {
    /// Map a numeric GTFS value (0-3).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(GtfsType::Regular),
            1 => Some(GtfsType::NotAvailable),
            2 => Some(GtfsType::MustPhone),
            3 => Some(GtfsType::MustCoordinateWithDriver),
            _ => None,
        }
    }

    /// Map a GTFS vocabulary term.
    ///
    /// Accepts the compact form (`gtfs:Regular`) and the expanded URI
    /// (`http://vocab.gtfs.org/terms#Regular`).
    ///
    /// # Examples
    ///
    /// ```
    /// use lc_planner::domain::GtfsType;
    ///
    /// assert_eq!(GtfsType::parse_uri("gtfs:NotAvailable"), Some(GtfsType::NotAvailable));
    /// assert_eq!(
    ///     GtfsType::parse_uri("http://vocab.gtfs.org/terms#MustPhone"),
    ///     Some(GtfsType::MustPhone)
    /// );
    /// assert_eq!(GtfsType::parse_uri("gtfs:Teleport"), None);
    /// ```
    pub fn parse_uri(uri: &str) -> Option<Self> {
        let term = uri
            .rsplit_once('#')
            .map(|(_, t)| t)
            .or_else(|| uri.strip_prefix("gtfs:"))
            .unwrap_or(uri);

        match term {
            "Regular" => Some(GtfsType::Regular),
            "NotAvailable" => Some(GtfsType::NotAvailable),
            "MustPhone" => Some(GtfsType::MustPhone),
            "MustCoordinateWithDriver" => Some(GtfsType::MustCoordinateWithDriver),
            _ => None,
        }
    }

    /// Returns the numeric GTFS value.
    pub fn code(&self) -> u8 {
        match self {
            GtfsType::Regular => 0,
            GtfsType::NotAvailable => 1,
            GtfsType::MustPhone => 2,
            GtfsType::MustCoordinateWithDriver => 3,
        }
    }

    /// Returns true unless the stop is explicitly unavailable.
    pub fn is_available(&self) -> bool {
        *self != GtfsType::NotAvailable
    }

    /// Returns true for a regularly scheduled stop.
    pub fn is_regular(&self) -> bool {
        *self == GtfsType::Regular
    }
}

/// A single hop of one vehicle between two consecutive stations.
///
/// Connections are immutable once ingested and shared as
/// `Arc<Connection>` between pages, profiles and routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Connection URI
    pub id: ConnectionId,
    /// Station the vehicle departs from
    pub departure_station: StationId,
    /// Station the vehicle arrives at
    pub arrival_station: StationId,
    /// Scheduled departure
    pub departure_time: TransitTime,
    /// Scheduled arrival
    pub arrival_time: TransitTime,
    /// Delay on departure
    pub departure_delay: Delay,
    /// Delay on arrival
    pub arrival_delay: Delay,
    /// Trip this connection belongs to
    pub trip: TripId,
    /// Route (line) of the trip
    pub route: RouteId,
    /// Headsign shown on the vehicle
    pub direction: String,
    /// Whether passengers may board at the departure station
    pub pickup_type: GtfsType,
    /// Whether passengers may alight at the arrival station
    pub drop_off_type: GtfsType,
}

impl Connection {
    /// Create an on-time connection with regular pickup and drop-off.
    pub fn new(
        id: ConnectionId,
        departure_station: StationId,
        arrival_station: StationId,
        departure_time: TransitTime,
        arrival_time: TransitTime,
        trip: TripId,
        route: RouteId,
    ) -> Self {
        Self {
            id,
            departure_station,
            arrival_station,
            departure_time,
            arrival_time,
            departure_delay: Delay::ZERO,
            arrival_delay: Delay::ZERO,
            trip,
            route,
            direction: String::new(),
            pickup_type: GtfsType::Regular,
            drop_off_type: GtfsType::Regular,
        }
    }

    /// Set departure and arrival delays.
    pub fn with_delays(mut self, departure: Delay, arrival: Delay) -> Self {
        self.departure_delay = departure;
        self.arrival_delay = arrival;
        self
    }

    /// Set the pickup type.
    pub fn with_pickup_type(mut self, pickup: GtfsType) -> Self {
        self.pickup_type = pickup;
        self
    }

    /// Set the drop-off type.
    pub fn with_drop_off_type(mut self, drop_off: GtfsType) -> Self {
        self.drop_off_type = drop_off;
        self
    }

    /// Set the headsign.
    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = direction.into();
        self
    }

    /// Scheduled time spent riding this connection.
    pub fn duration(&self) -> Duration {
        self.arrival_time.signed_duration_since(self.departure_time)
    }

    /// Expected departure including delay.
    pub fn delayed_departure(&self) -> TransitTime {
        self.departure_time.delayed(self.departure_delay)
    }

    /// Expected arrival including delay.
    pub fn delayed_arrival(&self) -> TransitTime {
        self.arrival_time.delayed(self.arrival_delay)
    }

    /// Returns true if passengers may board here at all.
    pub fn allows_pickup(&self) -> bool {
        self.pickup_type.is_available()
    }

    /// Returns true if passengers may alight here at all.
    pub fn allows_drop_off(&self) -> bool {
        self.drop_off_type.is_available()
    }
}
