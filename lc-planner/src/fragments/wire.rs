//! Linked Connections JSON-LD wire format.
//!
//! Servers publish connections in pages of ascending departure time:
//!
//! ```json
//! {
//!   "@id": "https://graph.irail.be/sncb/connections?departureTime=2018-08-09T10:00:00.000Z",
//!   "hydra:next": "...",
//!   "hydra:previous": "...",
//!   "@graph": [
//!     {
//!       "@id": "http://irail.be/connections/8821006/20180809/IC1832",
//!       "departureStop": "http://irail.be/stations/NMBS/008821006",
//!       "arrivalStop": "http://irail.be/stations/NMBS/008821121",
//!       "departureTime": "2018-08-09T10:00:00.000Z",
//!       "arrivalTime": "2018-08-09T10:05:00.000Z",
//!       "departureDelay": 60,
//!       "gtfs:trip": "http://irail.be/vehicle/IC1832/20180809",
//!       "gtfs:route": "http://irail.be/vehicle/IC1832",
//!       "direction": "Oostende"
//!     }
//!   ]
//! }
//! ```
//!
//! Decoding turns that into a [`Page`] in the planner's order: newest first.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    Connection, ConnectionId, Delay, GtfsType, RouteId, StationId, TransitTime, TripId,
};

use super::error::SourceError;
use super::page::{Page, PageCursor};

/// Top-level JSON-LD page.
#[derive(Debug, Deserialize)]
struct WirePage {
    #[serde(rename = "@id", default)]
    id: Option<String>,

    #[serde(rename = "hydra:previous", default)]
    previous: Option<String>,

    #[serde(rename = "@graph", default)]
    graph: Vec<Value>,
}

/// One `@graph` item.
#[derive(Debug, Deserialize)]
struct WireConnection {
    #[serde(rename = "@id")]
    id: String,

    #[serde(rename = "departureStop")]
    departure_stop: String,

    #[serde(rename = "arrivalStop")]
    arrival_stop: String,

    #[serde(rename = "departureTime")]
    departure_time: String,

    #[serde(rename = "arrivalTime")]
    arrival_time: String,

    #[serde(rename = "departureDelay", default)]
    departure_delay: Option<Seconds>,

    #[serde(rename = "arrivalDelay", default)]
    arrival_delay: Option<Seconds>,

    #[serde(rename = "gtfs:trip")]
    trip: String,

    #[serde(rename = "gtfs:route")]
    route: String,

    #[serde(default)]
    direction: Option<String>,

    #[serde(rename = "gtfs:pickupType", default)]
    pickup_type: Option<String>,

    #[serde(rename = "gtfs:dropOffType", default)]
    drop_off_type: Option<String>,
}

/// Delays are published as numbers by some servers and strings by others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(i64),
    Text(String),
}

impl Seconds {
    fn to_delay(&self) -> Result<Delay, String> {
        match self {
            Seconds::Number(n) => Ok(Delay::from_secs(*n)),
            Seconds::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Delay::from_secs)
                .map_err(|_| format!("invalid delay `{s}`")),
        }
    }
}

impl WireConnection {
    fn into_connection(self) -> Result<Connection, String> {
        let departure_time =
            TransitTime::parse_rfc3339(&self.departure_time).map_err(|e| e.to_string())?;
        let arrival_time =
            TransitTime::parse_rfc3339(&self.arrival_time).map_err(|e| e.to_string())?;

        let departure_delay = self
            .departure_delay
            .as_ref()
            .map(Seconds::to_delay)
            .transpose()?
            .unwrap_or(Delay::ZERO);
        let arrival_delay = self
            .arrival_delay
            .as_ref()
            .map(Seconds::to_delay)
            .transpose()?
            .unwrap_or(Delay::ZERO);

        let pickup_type = parse_gtfs_type(self.pickup_type.as_deref())?;
        let drop_off_type = parse_gtfs_type(self.drop_off_type.as_deref())?;

        let connection = Connection::new(
            ConnectionId::parse(&self.id).map_err(|e| e.to_string())?,
            StationId::parse(&self.departure_stop).map_err(|e| e.to_string())?,
            StationId::parse(&self.arrival_stop).map_err(|e| e.to_string())?,
            departure_time,
            arrival_time,
            TripId::parse(&self.trip).map_err(|e| e.to_string())?,
            RouteId::parse(&self.route).map_err(|e| e.to_string())?,
        )
        .with_delays(departure_delay, arrival_delay)
        .with_pickup_type(pickup_type)
        .with_drop_off_type(drop_off_type)
        .with_direction(self.direction.unwrap_or_default());

        Ok(connection)
    }
}

fn parse_gtfs_type(value: Option<&str>) -> Result<GtfsType, String> {
    match value {
        None => Ok(GtfsType::Regular),
        Some(uri) => GtfsType::parse_uri(uri).ok_or_else(|| format!("unknown GTFS type `{uri}`")),
    }
}

/// Decode every connection in a JSON-LD page body, in wire order.
///
/// # Errors
///
/// Returns `SourceError::Malformed` if the body is not a JSON object, or if
/// any `@graph` item is not an object or lacks a required field. One bad
/// item fails the whole page.
pub fn parse_connections(body: &str) -> Result<Vec<Arc<Connection>>, SourceError> {
    parse_wire_page(body).and_then(|page| decode_graph(page.graph))
}

/// Decode a JSON-LD page into the connections departing strictly before
/// `before`, latest first.
///
/// The cursor for the next-earlier page follows `hydra:previous` and is
/// bounded by the earliest departure published on this page. An empty page
/// is bounded by the `departureTime` it was requested for.
pub fn parse_page(body: &str, before: TransitTime) -> Result<Page, SourceError> {
    let page = parse_wire_page(body)?;
    let id = page.id.clone().unwrap_or_default();
    let previous_link = page.previous.clone();

    let mut connections = decode_graph(page.graph)?;
    let earliest = connections
        .iter()
        .map(|c| c.departure_time)
        .min()
        .or_else(|| departure_time_of(&id));

    connections.retain(|c| c.departure_time < before);
    connections.reverse();

    let previous = previous_link.map(|link| {
        let bound = earliest.map_or(before, |e| e.min(before));
        PageCursor::linked(bound, link)
    });

    Ok(Page::new(id, connections, previous))
}

/// The `departureTime` query parameter of a page URI.
fn departure_time_of(uri: &str) -> Option<TransitTime> {
    let url = reqwest::Url::parse(uri).ok()?;
    let (_, value) = url.query_pairs().find(|(key, _)| key == "departureTime")?;
    TransitTime::parse_rfc3339(&value).ok()
}

fn parse_wire_page(body: &str) -> Result<WirePage, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))
}

fn decode_graph(graph: Vec<Value>) -> Result<Vec<Arc<Connection>>, SourceError> {
    graph
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(SourceError::Malformed(format!(
                    "connection {index}: not an object"
                )));
            }
            let wire: WireConnection = serde_json::from_value(item)
                .map_err(|e| SourceError::Malformed(format!("connection {index}: {e}")))?;
            wire.into_connection()
                .map(Arc::new)
                .map_err(|reason| SourceError::Malformed(format!("connection {index}: {reason}")))
        })
        .collect()
}
