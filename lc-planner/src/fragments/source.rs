//! The connection source abstraction and an in-memory implementation.

use std::future::Future;
use std::sync::Arc;

use crate::domain::Connection;

use super::error::SourceError;
use super::page::{Page, PageCursor};

/// Default number of connections per in-memory page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Supplies timetable connections a page at a time, newest first.
///
/// This abstraction allows the planner to run against live servers,
/// offline files or test fixtures.
pub trait ConnectionSource: Send + Sync {
    /// Fetch the page of connections departing strictly before
    /// `cursor.before`, latest departure first.
    ///
    /// Returns `Ok(None)` once there is nothing earlier to read.
    fn next_page(
        &self,
        cursor: &PageCursor,
    ) -> impl Future<Output = Result<Option<Page>, SourceError>> + Send;
}

/// Serves a fixed list of connections in pages of a given size.
///
/// Connections sharing a departure time are never split across pages, so a
/// page may run over `page_size` when many connections depart together.
#[derive(Debug, Clone)]
pub struct MemorySource {
    /// Connections, latest departure first.
    connections: Arc<Vec<Arc<Connection>>>,
    page_size: usize,
}

impl MemorySource {
    /// Create a source over the given connections, in any order.
    pub fn new(connections: Vec<Connection>, page_size: usize) -> Self {
        Self::from_shared(connections.into_iter().map(Arc::new).collect(), page_size)
    }

    /// Create a source over already shared connections.
    pub fn from_shared(mut connections: Vec<Arc<Connection>>, page_size: usize) -> Self {
        connections.sort_by(|a, b| b.departure_time.cmp(&a.departure_time));
        Self {
            connections: Arc::new(connections),
            page_size: page_size.max(1),
        }
    }

    /// Total number of connections held.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns true if the source holds no connections.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Slice out the page for a cursor.
    pub fn page(&self, cursor: &PageCursor) -> Option<Page> {
        let all = self.connections.as_slice();
        let start = all.partition_point(|c| c.departure_time >= cursor.before);
        if start >= all.len() {
            return None;
        }

        let mut end = (start + self.page_size).min(all.len());
        let last_departure = all[end - 1].departure_time;
        while end < all.len() && all[end].departure_time == last_departure {
            end += 1;
        }

        let previous = (end < all.len()).then(|| PageCursor::before(last_departure));
        Some(Page {
            id: format!("memory:{}", cursor.before.to_rfc3339()),
            connections: all[start..end].to_vec(),
            previous,
        })
    }
}

impl ConnectionSource for MemorySource {
    async fn next_page(&self, cursor: &PageCursor) -> Result<Option<Page>, SourceError> {
        Ok(self.page(cursor))
    }
}
