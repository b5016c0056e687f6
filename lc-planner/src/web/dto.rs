//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Journey, Message, Route, RouteLeg, RouteLegEnd, ScanStats, TargetTime, Transfer, TransferKind,
};
use crate::liveboard::{Liveboard, LiveboardEntry};

/// Request to plan a journey.
///
/// At most one of `departure_time` and `arrival_time` may be given; with
/// neither, the journey departs now.
#[derive(Debug, Deserialize)]
pub struct PlanJourneyRequest {
    /// Origin station URI
    pub from: String,

    /// Destination station URI
    pub to: String,

    /// Depart at or after this time (RFC 3339)
    pub departure_time: Option<String>,

    /// Arrive at or before this time (RFC 3339)
    pub arrival_time: Option<String>,

    /// Maximum number of routes to return
    pub max_results: Option<usize>,

    /// Maximum number of transfers per route
    pub max_transfers: Option<usize>,
}

/// Response for journey planning.
#[derive(Debug, Serialize)]
pub struct JourneyResponse {
    /// Origin station URI
    pub from: String,

    /// Destination station URI
    pub to: String,

    /// Either "departure" or "arrival"
    pub time_kind: &'static str,

    /// The requested time
    pub time: String,

    /// Found routes, best first
    pub routes: Vec<RouteResult>,

    /// Scan counters
    pub stats: StatsResult,
}

/// A route option.
#[derive(Debug, Serialize)]
pub struct RouteResult {
    /// Scheduled departure from the origin
    pub departure_time: String,

    /// Scheduled arrival at the destination
    pub arrival_time: String,

    /// Delay at departure (seconds)
    pub departure_delay_secs: i64,

    /// Delay at arrival (seconds)
    pub arrival_delay_secs: i64,

    /// Scheduled duration in minutes
    pub duration_mins: i64,

    /// Expected duration in minutes with delays applied
    pub delay_adjusted_duration_mins: i64,

    /// Number of changes
    pub transfer_count: usize,

    /// Stations called at, both ends included
    pub station_count: usize,

    /// Whether any leg is cancelled
    pub partially_canceled: bool,

    /// Legs in travel order
    pub legs: Vec<LegResult>,

    /// Boarding, changes and alighting
    pub transfers: Vec<TransferResult>,

    /// Alerts for the trips used
    pub trip_alerts: Vec<MessageResult>,

    /// Alerts for the lines used
    pub vehicle_alerts: Vec<MessageResult>,

    /// Planner remarks
    pub remarks: Vec<MessageResult>,
}

/// A ride on one trip.
#[derive(Debug, Serialize)]
pub struct LegResult {
    /// Trip URI
    pub trip: String,

    /// Route (line) URI
    pub route: String,

    /// Headsign
    pub direction: String,

    /// Where the passenger boards
    pub departure: LegEndResult,

    /// Where the passenger alights
    pub arrival: LegEndResult,

    /// Stations passed through
    pub intermediate_stops: usize,

    /// Scheduled duration in minutes
    pub duration_mins: i64,
}

/// One end of a leg.
#[derive(Debug, Serialize)]
pub struct LegEndResult {
    /// Station URI
    pub station: String,

    /// Connection URI
    pub connection: String,

    /// Scheduled time
    pub time: String,

    /// Time with the delay applied
    pub expected_time: String,

    /// Delay (seconds)
    pub delay_secs: i64,

    /// Platform, if known
    pub platform: Option<String>,

    /// Whether the stop is cancelled
    pub canceled: bool,

    /// Whether the event is in the past
    pub passed: bool,
}

/// A point where the passenger is not on board.
#[derive(Debug, Serialize)]
pub struct TransferResult {
    /// "departure", "transfer" or "arrival"
    pub kind: &'static str,

    /// Station URI
    pub station: String,

    /// Scheduled time
    pub time: String,

    /// Delay (seconds)
    pub delay_secs: i64,

    /// Scheduled wait in minutes (changes only)
    pub wait_mins: i64,

    /// Wait in minutes with delays applied (changes only)
    pub effective_mins: Option<i64>,
}

/// An alert or remark.
#[derive(Debug, Serialize)]
pub struct MessageResult {
    pub header: String,
    pub description: String,
    pub lead: String,
    pub link: Option<String>,
}

/// Scan counters.
#[derive(Debug, Serialize)]
pub struct StatsResult {
    pub pages_scanned: usize,
    pub connections_scanned: usize,
    pub warnings: usize,
    pub profile_entries: usize,
}

/// Query string for a station liveboard.
///
/// With no `from` the board starts now; with no `until` it covers the
/// default window.
#[derive(Debug, Deserialize)]
pub struct LiveboardRequest {
    /// Station URI
    pub station: String,

    /// "departures" (default) or "arrivals"
    pub mode: Option<String>,

    /// Window start (RFC 3339)
    pub from: Option<String>,

    /// Window end (RFC 3339)
    pub until: Option<String>,

    /// "next" or "previous" to extend the board until results are found
    pub extend: Option<String>,
}

/// Response for a liveboard.
#[derive(Debug, Serialize)]
pub struct LiveboardResponse {
    /// Station URI
    pub station: String,

    /// "departures" or "arrivals"
    pub mode: &'static str,

    /// Window start
    pub from: String,

    /// Window end, exclusive
    pub until: String,

    /// Rows in time order
    pub entries: Vec<LiveboardEntryResult>,

    /// The window right after this one
    pub next: WindowResult,

    /// The window right before this one
    pub previous: WindowResult,
}

/// One liveboard row.
#[derive(Debug, Serialize)]
pub struct LiveboardEntryResult {
    /// Connection URI
    pub connection: String,

    /// Trip URI
    pub trip: String,

    /// Route URI
    pub route: String,

    /// Headsign
    pub direction: String,

    /// Next stop for departures, previous stop for arrivals
    pub adjacent_station: String,

    /// Scheduled time
    pub time: String,

    /// Time with the delay applied
    pub expected_time: String,

    /// Delay (seconds)
    pub delay_secs: i64,

    /// Whether the event is in the past
    pub passed: bool,
}

/// A time window.
#[derive(Debug, Serialize)]
pub struct WindowResult {
    pub from: String,
    pub until: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl JourneyResponse {
    /// Create from a domain Journey.
    pub fn from_journey(journey: &Journey) -> Self {
        let (time_kind, time) = match journey.target() {
            TargetTime::DepartAfter(t) => ("departure", t),
            TargetTime::ArriveBefore(t) => ("arrival", t),
        };

        Self {
            from: journey.origin().to_string(),
            to: journey.destination().to_string(),
            time_kind,
            time: time.to_rfc3339(),
            routes: journey.routes().iter().map(RouteResult::from_route).collect(),
            stats: StatsResult::from_stats(&journey.stats()),
        }
    }
}

impl RouteResult {
    /// Create from a domain Route.
    pub fn from_route(route: &Route) -> Self {
        Self {
            departure_time: route.departure_time().to_rfc3339(),
            arrival_time: route.arrival_time().to_rfc3339(),
            departure_delay_secs: route.departure_delay().as_secs(),
            arrival_delay_secs: route.arrival_delay().as_secs(),
            duration_mins: route.duration().num_minutes(),
            delay_adjusted_duration_mins: route.delay_adjusted_duration().num_minutes(),
            transfer_count: route.transfer_count(),
            station_count: route.station_count(),
            partially_canceled: route.is_partially_canceled(),
            legs: route.legs().iter().map(LegResult::from_leg).collect(),
            transfers: route
                .transfers()
                .iter()
                .map(TransferResult::from_transfer)
                .collect(),
            trip_alerts: messages(route.trip_alerts()),
            vehicle_alerts: messages(route.vehicle_alerts()),
            remarks: messages(route.remarks()),
        }
    }
}

impl LegResult {
    /// Create from a domain RouteLeg.
    pub fn from_leg(leg: &RouteLeg) -> Self {
        let vehicle = leg.vehicle();
        Self {
            trip: vehicle.trip.to_string(),
            route: vehicle.route.to_string(),
            direction: vehicle.direction.clone(),
            departure: LegEndResult::from_end(leg.departure()),
            arrival: LegEndResult::from_end(leg.arrival()),
            intermediate_stops: leg.intermediate_stop_count(),
            duration_mins: leg.duration().num_minutes(),
        }
    }
}

impl LegEndResult {
    /// Create from a domain RouteLegEnd.
    pub fn from_end(end: &RouteLegEnd) -> Self {
        Self {
            station: end.station.to_string(),
            connection: end.connection.to_string(),
            time: end.time.to_rfc3339(),
            expected_time: end.delayed_time().to_rfc3339(),
            delay_secs: end.delay.as_secs(),
            platform: end.platform.clone(),
            canceled: end.canceled,
            passed: end.passed,
        }
    }
}

impl TransferResult {
    /// Create from a domain Transfer.
    pub fn from_transfer(transfer: &Transfer) -> Self {
        let kind = match transfer.kind() {
            TransferKind::Departure => "departure",
            TransferKind::Transfer => "transfer",
            TransferKind::Arrival => "arrival",
        };

        Self {
            kind,
            station: transfer.station().to_string(),
            time: transfer.time().to_rfc3339(),
            delay_secs: transfer.delay().as_secs(),
            wait_mins: transfer.wait_time().num_minutes(),
            effective_mins: transfer.effective_transfer_time().map(|d| d.num_minutes()),
        }
    }
}

impl MessageResult {
    /// Create from a domain Message.
    pub fn from_message(message: &Message) -> Self {
        Self {
            header: message.header.clone(),
            description: message.description.clone(),
            lead: message.lead.clone(),
            link: message.link.clone(),
        }
    }
}

impl StatsResult {
    /// Create from scan counters.
    pub fn from_stats(stats: &ScanStats) -> Self {
        Self {
            pages_scanned: stats.pages_scanned,
            connections_scanned: stats.connections_scanned,
            warnings: stats.warnings,
            profile_entries: stats.profile_entries,
        }
    }
}

impl LiveboardResponse {
    /// Create from a domain Liveboard.
    pub fn from_board(board: &Liveboard) -> Self {
        let next = board.next_query();
        let previous = board.previous_query();

        Self {
            station: board.station().to_string(),
            mode: board.mode().as_str(),
            from: board.from().to_rfc3339(),
            until: board.until().to_rfc3339(),
            entries: board
                .entries()
                .iter()
                .map(LiveboardEntryResult::from_entry)
                .collect(),
            next: WindowResult {
                from: next.from.to_rfc3339(),
                until: next.until.to_rfc3339(),
            },
            previous: WindowResult {
                from: previous.from.to_rfc3339(),
                until: previous.until.to_rfc3339(),
            },
        }
    }
}

impl LiveboardEntryResult {
    /// Create from a domain LiveboardEntry.
    pub fn from_entry(entry: &LiveboardEntry) -> Self {
        Self {
            connection: entry.connection.to_string(),
            trip: entry.trip.to_string(),
            route: entry.route.to_string(),
            direction: entry.direction.clone(),
            adjacent_station: entry.adjacent_station.to_string(),
            time: entry.time.to_rfc3339(),
            expected_time: entry.delayed_time().to_rfc3339(),
            delay_secs: entry.delay.as_secs(),
            passed: entry.passed,
        }
    }
}

fn messages(messages: &[Message]) -> Vec<MessageResult> {
    messages.iter().map(MessageResult::from_message).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Connection, ConnectionId, Delay, RouteId, StationId, TransitTime, TripId,
    };
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn time(s: &str) -> TransitTime {
        TransitTime::parse_hhmm(s, NaiveDate::from_ymd_opt(2018, 8, 9).unwrap()).unwrap()
    }

    fn station(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    fn leg(id: &str, trip: &str, from: &str, to: &str, dep: &str, arr: &str) -> RouteLeg {
        let c = Connection::new(
            ConnectionId::parse(id).unwrap(),
            station(from),
            station(to),
            time(dep),
            time(arr),
            TripId::parse(trip).unwrap(),
            RouteId::parse("http://irail.be/vehicle/IC1832").unwrap(),
        )
        .with_direction("Oostende")
        .with_delays(Delay::from_mins(2), Delay::ZERO);
        RouteLeg::new(vec![Arc::new(c)], time("10:10")).unwrap()
    }

    fn make_journey() -> Journey {
        let route = Route::new(vec![
            leg("c1", "t1", "A", "B", "10:00", "10:20"),
            leg("c2", "t2", "B", "C", "10:30", "11:00"),
        ])
        .unwrap()
        .with_remarks(vec![Message::new("Note", "Check the board")]);

        Journey::new(
            station("A"),
            station("C"),
            TargetTime::DepartAfter(time("09:00")),
            vec![route],
            ScanStats {
                pages_scanned: 3,
                connections_scanned: 42,
                ..ScanStats::default()
            },
        )
    }

    #[test]
    fn request_with_defaults() {
        let req: PlanJourneyRequest =
            serde_json::from_str(r#"{"from": "A", "to": "C"}"#).unwrap();

        assert_eq!(req.from, "A");
        assert_eq!(req.to, "C");
        assert!(req.departure_time.is_none());
        assert!(req.arrival_time.is_none());
        assert!(req.max_results.is_none());
    }

    #[test]
    fn journey_response_from_journey() {
        let response = JourneyResponse::from_journey(&make_journey());

        assert_eq!(response.from, "A");
        assert_eq!(response.time_kind, "departure");
        assert_eq!(response.time, "2018-08-09T09:00:00Z");
        assert_eq!(response.routes.len(), 1);
        assert_eq!(response.stats.pages_scanned, 3);
        assert_eq!(response.stats.connections_scanned, 42);
    }

    #[test]
    fn route_result_fields() {
        let response = JourneyResponse::from_journey(&make_journey());
        let route = &response.routes[0];

        assert_eq!(route.departure_time, "2018-08-09T10:00:00Z");
        assert_eq!(route.arrival_time, "2018-08-09T11:00:00Z");
        assert_eq!(route.departure_delay_secs, 120);
        assert_eq!(route.duration_mins, 60);
        assert_eq!(route.transfer_count, 1);
        assert_eq!(route.station_count, 3);
        assert_eq!(route.remarks[0].header, "Note");
        assert!(route.trip_alerts.is_empty());
    }

    #[test]
    fn leg_result_from_leg() {
        let result = LegResult::from_leg(&leg("c1", "t1", "A", "B", "10:00", "10:20"));

        assert_eq!(result.trip, "t1");
        assert_eq!(result.direction, "Oostende");
        assert_eq!(result.departure.station, "A");
        assert_eq!(result.departure.expected_time, "2018-08-09T10:02:00Z");
        assert_eq!(result.departure.delay_secs, 120);
        assert!(result.departure.passed);
        assert!(!result.arrival.passed);
        assert_eq!(result.intermediate_stops, 0);
        assert_eq!(result.duration_mins, 20);
    }

    #[test]
    fn transfer_kinds() {
        let response = JourneyResponse::from_journey(&make_journey());
        let transfers = &response.routes[0].transfers;

        let kinds: Vec<_> = transfers.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec!["departure", "transfer", "arrival"]);
        assert_eq!(transfers[1].wait_mins, 10);
        // Departure of the second leg is 2 min late
        assert_eq!(transfers[1].effective_mins, Some(12));
        assert_eq!(transfers[0].effective_mins, None);
    }

    #[test]
    fn liveboard_response_fields() {
        use crate::liveboard::{BoardMode, LiveboardQuery};

        let c = Connection::new(
            ConnectionId::parse("c1").unwrap(),
            station("B"),
            station("C"),
            time("10:10"),
            time("10:30"),
            TripId::parse("t1").unwrap(),
            RouteId::parse("r1").unwrap(),
        )
        .with_delays(Delay::from_mins(2), Delay::ZERO)
        .with_direction("Gent");
        let query =
            LiveboardQuery::new(station("B"), BoardMode::Departures, time("10:00"), time("10:30"));
        let board = Liveboard::new(
            &query,
            vec![LiveboardEntry::of(&c, BoardMode::Departures, time("10:11"))],
        );

        let response = LiveboardResponse::from_board(&board);

        assert_eq!(response.mode, "departures");
        assert_eq!(response.next.from, response.until);
        assert_eq!(response.previous.until, response.from);
        let entry = &response.entries[0];
        assert_eq!(entry.adjacent_station, "C");
        assert_eq!(entry.direction, "Gent");
        assert_eq!(entry.delay_secs, 120);
        assert_eq!(entry.expected_time, time("10:12").to_rfc3339());
        assert!(!entry.passed);
    }

    #[test]
    fn response_serializes() {
        let response = JourneyResponse::from_journey(&make_journey());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["routes"][0]["legs"][1]["trip"], "t2");
        assert_eq!(json["routes"][0]["transfers"][1]["kind"], "transfer");
        assert_eq!(json["stats"]["warnings"], 0);
    }
}
