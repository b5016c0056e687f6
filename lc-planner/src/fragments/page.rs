//! Connection pages and the cursors that address them.

use std::sync::Arc;

use crate::domain::{Connection, TransitTime};

/// Where to continue reading the timetable from.
///
/// A cursor asks for connections departing strictly before `before`. Linked
/// sources also carry the URI of the page to fetch (`hydra:previous`), which
/// takes precedence over building a URI from the timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageCursor {
    /// Exclusive upper bound on departure times
    pub before: TransitTime,
    /// Page URI hint from the previous page, if any
    pub link: Option<String>,
}

impl PageCursor {
    /// A cursor addressed by time only.
    pub fn before(before: TransitTime) -> Self {
        Self { before, link: None }
    }

    /// A cursor following a page link.
    pub fn linked(before: TransitTime, link: impl Into<String>) -> Self {
        Self {
            before,
            link: Some(link.into()),
        }
    }
}

/// A page of connections, newest first.
///
/// # Invariants
///
/// - `connections` are in non-increasing departure order
/// - `previous` addresses the next-earlier page, or is `None` at the end of
///   the published history
#[derive(Debug, Clone)]
pub struct Page {
    /// Page URI or other identifier, for logging
    pub id: String,
    /// Connections, latest departure first
    pub connections: Vec<Arc<Connection>>,
    /// Cursor for the next-earlier page
    pub previous: Option<PageCursor>,
}

impl Page {
    /// Create a page, sorting the connections newest first.
    pub fn new(
        id: impl Into<String>,
        mut connections: Vec<Arc<Connection>>,
        previous: Option<PageCursor>,
    ) -> Self {
        connections.sort_by(|a, b| b.departure_time.cmp(&a.departure_time));
        Self {
            id: id.into(),
            connections,
            previous,
        }
    }

    /// Returns true if the page holds no connections.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of connections on the page.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Latest departure on the page.
    pub fn latest_departure(&self) -> Option<TransitTime> {
        self.connections.first().map(|c| c.departure_time)
    }

    /// Earliest departure on the page.
    pub fn earliest_departure(&self) -> Option<TransitTime> {
        self.connections.last().map(|c| c.departure_time)
    }
}
