//! Liveboard types.

use std::collections::HashSet;

use chrono::Duration;

use crate::domain::{Connection, ConnectionId, Delay, RouteId, StationId, TransitTime, TripId};

use super::error::LiveboardError;

/// Length of a board's window when the caller gives no end.
pub const DEFAULT_WINDOW_MINS: i64 = 30;

/// Which events a board lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardMode {
    /// Vehicles leaving the station
    Departures,
    /// Vehicles reaching the station
    Arrivals,
}

impl BoardMode {
    /// Parse `departures` or `arrivals`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "departures" => Some(BoardMode::Departures),
            "arrivals" => Some(BoardMode::Arrivals),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BoardMode::Departures => "departures",
            BoardMode::Arrivals => "arrivals",
        }
    }

    /// Returns true if `connection` is an event at `station` a passenger
    /// could use: boarding for departures, alighting for arrivals.
    pub fn lists(&self, connection: &Connection, station: &StationId) -> bool {
        match self {
            BoardMode::Departures => {
                connection.departure_station == *station && connection.allows_pickup()
            }
            BoardMode::Arrivals => {
                connection.arrival_station == *station && connection.allows_drop_off()
            }
        }
    }

    /// Scheduled time of the listed event.
    pub fn event_time(&self, connection: &Connection) -> TransitTime {
        match self {
            BoardMode::Departures => connection.departure_time,
            BoardMode::Arrivals => connection.arrival_time,
        }
    }
}

/// A request for one station's board over `[from, until)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveboardQuery {
    pub station: StationId,
    pub mode: BoardMode,
    pub from: TransitTime,
    pub until: TransitTime,
}

impl LiveboardQuery {
    pub fn new(station: StationId, mode: BoardMode, from: TransitTime, until: TransitTime) -> Self {
        Self {
            station,
            mode,
            from,
            until,
        }
    }

    /// A board for the default window starting at `from`.
    pub fn starting_at(station: StationId, mode: BoardMode, from: TransitTime) -> Self {
        let until = from + Duration::minutes(DEFAULT_WINDOW_MINS);
        Self::new(station, mode, from, until)
    }

    /// Length of the window.
    pub fn span(&self) -> Duration {
        self.until.signed_duration_since(self.from)
    }

    /// Returns true if `time` falls inside the window.
    pub fn contains(&self, time: TransitTime) -> bool {
        self.from <= time && time < self.until
    }

    /// Check the window is not empty.
    ///
    /// # Errors
    ///
    /// Returns [`LiveboardError::EmptyWindow`] unless `until` is after `from`.
    pub fn validate(&self) -> Result<(), LiveboardError> {
        if self.until <= self.from {
            return Err(LiveboardError::EmptyWindow);
        }
        Ok(())
    }
}

/// One row of a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveboardEntry {
    /// Connection the event belongs to
    pub connection: ConnectionId,
    /// Trip URI
    pub trip: TripId,
    /// Route (line) URI
    pub route: RouteId,
    /// Headsign
    pub direction: String,
    /// Next stop for a departure, previous stop for an arrival
    pub adjacent_station: StationId,
    /// Scheduled time of the event
    pub time: TransitTime,
    /// Delay on the event
    pub delay: Delay,
    /// Whether the event is already in the past
    pub passed: bool,
}

impl LiveboardEntry {
    /// The row `mode` shows for `connection`, as seen at `now`.
    pub fn of(connection: &Connection, mode: BoardMode, now: TransitTime) -> Self {
        let (adjacent_station, delay) = match mode {
            BoardMode::Departures => (&connection.arrival_station, connection.departure_delay),
            BoardMode::Arrivals => (&connection.departure_station, connection.arrival_delay),
        };
        let time = mode.event_time(connection);

        Self {
            connection: connection.id.clone(),
            trip: connection.trip.clone(),
            route: connection.route.clone(),
            direction: connection.direction.clone(),
            adjacent_station: adjacent_station.clone(),
            time,
            delay,
            passed: time.delayed(delay) < now,
        }
    }

    /// Expected time including delay.
    pub fn delayed_time(&self) -> TransitTime {
        self.time.delayed(self.delay)
    }
}

/// Departures or arrivals at one station within a window.
///
/// # Invariants
///
/// - Every entry's scheduled time lies in `[from, until)`
/// - Entries are ordered by scheduled time, then connection
/// - No connection appears twice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Liveboard {
    station: StationId,
    mode: BoardMode,
    from: TransitTime,
    until: TransitTime,
    entries: Vec<LiveboardEntry>,
}

impl Liveboard {
    /// Package the entries found for `query`.
    ///
    /// Entries outside the window are dropped, duplicates are dropped and
    /// the rest are put in order.
    pub fn new(query: &LiveboardQuery, entries: Vec<LiveboardEntry>) -> Self {
        Self::covering(
            query.station.clone(),
            query.mode,
            query.from,
            query.until,
            entries,
        )
    }

    fn covering(
        station: StationId,
        mode: BoardMode,
        from: TransitTime,
        until: TransitTime,
        mut entries: Vec<LiveboardEntry>,
    ) -> Self {
        entries.retain(|e| from <= e.time && e.time < until);
        entries.sort_by(|a, b| (a.time, &a.connection).cmp(&(b.time, &b.connection)));

        let mut seen = HashSet::with_capacity(entries.len());
        entries.retain(|e| seen.insert(e.connection.clone()));

        Self {
            station,
            mode,
            from,
            until,
            entries,
        }
    }

    pub fn station(&self) -> &StationId {
        &self.station
    }

    pub fn mode(&self) -> BoardMode {
        self.mode
    }

    /// Start of the window, inclusive.
    pub fn from(&self) -> TransitTime {
        self.from
    }

    /// End of the window, exclusive.
    pub fn until(&self) -> TransitTime {
        self.until
    }

    /// Rows in time order.
    pub fn entries(&self) -> &[LiveboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The window of the same length right after this one.
    pub fn next_query(&self) -> LiveboardQuery {
        let span = self.until.signed_duration_since(self.from);
        LiveboardQuery::new(self.station.clone(), self.mode, self.until, self.until + span)
    }

    /// The window of the same length right before this one.
    pub fn previous_query(&self) -> LiveboardQuery {
        let span = self.until.signed_duration_since(self.from);
        LiveboardQuery::new(self.station.clone(), self.mode, self.from - span, self.from)
    }

    /// Combine with a board for an adjacent window of the same station and
    /// mode. The result covers both windows.
    pub(super) fn merge(self, other: Liveboard) -> Liveboard {
        let from = self.from.min(other.from);
        let until = self.until.max(other.until);
        let mut entries = self.entries;
        entries.extend(other.entries);
        Self::covering(self.station, self.mode, from, until, entries)
    }
}
