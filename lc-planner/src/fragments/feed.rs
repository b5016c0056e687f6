//! Pipelined page feed.
//!
//! While the planner scans one page, the next-earlier page is already being
//! fetched by a spawned task. Results go through a [`Dispatcher`] and are
//! handed out strictly in request order.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::dispatcher::{Dispatcher, PageResult};
use super::error::SourceError;
use super::page::{Page, PageCursor};
use super::source::ConnectionSource;

struct InFlight {
    cursor: PageCursor,
    rx: oneshot::Receiver<PageResult>,
    task: JoinHandle<()>,
}

/// Walks a source backwards through time, one page ahead of the reader.
///
/// Dropping the feed aborts any fetch still in flight.
pub struct PageFeed<S> {
    source: Arc<S>,
    dispatcher: Arc<Dispatcher>,
    in_flight: VecDeque<InFlight>,
    visited: HashSet<String>,
}

impl<S: ConnectionSource + 'static> PageFeed<S> {
    /// Start fetching at `cursor`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(source: Arc<S>, cursor: PageCursor) -> Self {
        let mut feed = Self {
            source,
            dispatcher: Arc::new(Dispatcher::new()),
            in_flight: VecDeque::new(),
            visited: HashSet::new(),
        };
        feed.request(cursor);
        feed
    }

    fn request(&mut self, cursor: PageCursor) {
        if let Some(link) = &cursor.link {
            self.visited.insert(link.clone());
        }
        let rx = self.dispatcher.register(cursor.clone());
        let source = Arc::clone(&self.source);
        let dispatcher = Arc::clone(&self.dispatcher);
        let key = cursor.clone();

        let task = tokio::spawn(async move {
            let result = source.next_page(&key).await;
            dispatcher.resolve(&key, result);
        });

        self.in_flight.push_back(InFlight { cursor, rx, task });
    }

    /// Number of page requests not yet handed out.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// The next page, latest departures first.
    ///
    /// Returns `Ok(None)` at the end of history. Cancel-safe: if the returned
    /// future is dropped before completing, the pending page is kept and the
    /// next call picks it up.
    pub async fn next(&mut self) -> Result<Option<Page>, SourceError> {
        let Some(front) = self.in_flight.front_mut() else {
            return Ok(None);
        };

        let received = (&mut front.rx).await;
        let Some(done) = self.in_flight.pop_front() else {
            return Ok(None);
        };

        let page = match received {
            Ok(Ok(Some(page))) => page,
            Ok(Ok(None)) => return Ok(None),
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(SourceError::Unavailable(
                    "page fetch ended without a result".to_string(),
                ));
            }
        };

        // A linked page that has not been visited yet is always followed, so
        // an empty page (which cannot narrow the bound) does not end the walk.
        match &page.previous {
            Some(previous)
                if previous.before < done.cursor.before || self.is_unvisited(previous) =>
            {
                self.request(previous.clone());
            }
            Some(previous) => {
                warn!(
                    page = %page.id,
                    previous = %previous.before.to_rfc3339(),
                    "previous page does not go back in time, stopping"
                );
            }
            None => debug!(page = %page.id, "reached end of history"),
        }

        Ok(Some(page))
    }

    fn is_unvisited(&self, cursor: &PageCursor) -> bool {
        cursor
            .link
            .as_ref()
            .is_some_and(|link| !self.visited.contains(link))
    }
}

impl<S> Drop for PageFeed<S> {
    fn drop(&mut self) {
        for pending in self.in_flight.drain(..) {
            pending.task.abort();
        }
        self.dispatcher.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Connection, ConnectionId, RouteId, StationId, TransitTime, TripId};
    use crate::fragments::MemorySource;
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn time(s: &str) -> TransitTime {
        TransitTime::parse_hhmm(s, NaiveDate::from_ymd_opt(2018, 8, 9).unwrap()).unwrap()
    }

    fn conn(id: &str, dep: &str) -> Connection {
        Connection::new(
            ConnectionId::parse(id).unwrap(),
            StationId::parse("A").unwrap(),
            StationId::parse("B").unwrap(),
            time(dep),
            time(dep) + Duration::minutes(5),
            TripId::parse(id).unwrap(),
            RouteId::parse("r").unwrap(),
        )
    }

    #[tokio::test]
    async fn walks_all_pages_in_order() {
        let source = MemorySource::new(
            vec![
                conn("a", "10:00"),
                conn("b", "10:10"),
                conn("c", "10:20"),
                conn("d", "10:30"),
                conn("e", "10:40"),
            ],
            2,
        );
        let mut feed = PageFeed::start(Arc::new(source), PageCursor::before(time("12:00")));

        let mut seen = Vec::new();
        while let Some(page) = feed.next().await.unwrap() {
            seen.extend(page.connections.iter().map(|c| c.id.as_str().to_string()));
        }
        assert_eq!(seen, vec!["e", "d", "c", "b", "a"]);
        assert_eq!(feed.in_flight(), 0);
    }

    #[tokio::test]
    async fn prefetches_one_page_ahead() {
        let source = MemorySource::new(vec![conn("a", "10:00"), conn("b", "10:10")], 1);
        let mut feed = PageFeed::start(Arc::new(source), PageCursor::before(time("12:00")));

        assert_eq!(feed.in_flight(), 1);
        feed.next().await.unwrap().unwrap();
        assert_eq!(feed.in_flight(), 1);
        feed.next().await.unwrap().unwrap();
        assert_eq!(feed.in_flight(), 0);
        assert!(feed.next().await.unwrap().is_none());
    }

    /// Always claims to have an earlier page at the same cursor.
    struct StuckSource {
        calls: AtomicUsize,
    }

    impl ConnectionSource for StuckSource {
        async fn next_page(&self, cursor: &PageCursor) -> Result<Option<Page>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Page::new("stuck", vec![], Some(cursor.clone()))))
        }
    }

    #[tokio::test]
    async fn stops_when_previous_does_not_advance() {
        let source = Arc::new(StuckSource {
            calls: AtomicUsize::new(0),
        });
        let mut feed = PageFeed::start(Arc::clone(&source), PageCursor::before(time("12:00")));

        assert!(feed.next().await.unwrap().is_some());
        assert!(feed.next().await.unwrap().is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    /// Serves fixed hydra documents by URI, as a server would.
    struct LinkedSource {
        bodies: Vec<(&'static str, String)>,
        calls: AtomicUsize,
    }

    impl ConnectionSource for LinkedSource {
        async fn next_page(&self, cursor: &PageCursor) -> Result<Option<Page>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let uri = cursor.link.clone().unwrap_or_else(|| page_uri("p3"));
            let Some((_, body)) = self.bodies.iter().find(|(id, _)| page_uri(id) == uri) else {
                return Ok(None);
            };
            crate::fragments::parse_page(body, cursor.before).map(Some)
        }
    }

    fn page_uri(name: &str) -> String {
        format!("http://example.org/{name}")
    }

    fn document(
        name: &str,
        departure_time: &str,
        items: &[(&str, &str)],
        previous: Option<&str>,
    ) -> String {
        let graph: Vec<serde_json::Value> = items
            .iter()
            .map(|(cid, dep)| {
                serde_json::json!({
                    "@id": cid,
                    "@type": "Connection",
                    "departureStop": "A",
                    "arrivalStop": "B",
                    "departureTime": format!("2018-08-09T{dep}:00.000Z"),
                    "arrivalTime": format!("2018-08-09T{dep}:30.000Z"),
                    "gtfs:trip": cid,
                    "gtfs:route": "r",
                })
            })
            .collect();
        let mut doc = serde_json::json!({
            "@id": format!(
                "{}?departureTime=2018-08-09T{departure_time}:00.000Z",
                page_uri(name)
            ),
            "@graph": graph,
        });
        if let Some(previous) = previous {
            doc["hydra:previous"] = serde_json::Value::from(page_uri(previous));
        }
        doc.to_string()
    }

    #[tokio::test]
    async fn walks_through_an_empty_page() {
        let source = Arc::new(LinkedSource {
            bodies: vec![
                ("p3", document("p3", "10:00", &[("c3", "10:10")], Some("p2"))),
                ("p2", document("p2", "09:00", &[], Some("p1"))),
                ("p1", document("p1", "08:00", &[("c1", "08:10")], None)),
            ],
            calls: AtomicUsize::new(0),
        });
        let mut feed = PageFeed::start(Arc::clone(&source), PageCursor::before(time("12:00")));

        let mut pages = Vec::new();
        let mut seen = Vec::new();
        while let Some(page) = feed.next().await.unwrap() {
            let name = page.id.trim_start_matches("http://example.org/");
            pages.push(name.split('?').next().unwrap_or_default().to_string());
            seen.extend(page.connections.iter().map(|c| c.id.as_str().to_string()));
        }
        assert_eq!(pages, vec!["p3", "p2", "p1"]);
        assert_eq!(seen, vec!["c3", "c1"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn linked_pages_are_not_revisited() {
        // Two empty pages pointing at each other.
        let source = Arc::new(LinkedSource {
            bodies: vec![
                ("p3", document("p3", "10:00", &[], Some("p2"))),
                ("p2", document("p2", "10:00", &[], Some("p3"))),
            ],
            calls: AtomicUsize::new(0),
        });
        let mut feed = PageFeed::start(Arc::clone(&source), PageCursor::before(time("12:00")));

        let mut pages = 0;
        while feed.next().await.unwrap().is_some() {
            pages += 1;
        }
        // p3 is first fetched by time, then once by link
        assert_eq!(pages, 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    struct FailingSource;

    impl ConnectionSource for FailingSource {
        async fn next_page(&self, _cursor: &PageCursor) -> Result<Option<Page>, SourceError> {
            Err(SourceError::Http {
                status: 500,
                message: "boom".into(),
            })
        }
    }

    #[tokio::test]
    async fn source_errors_surface() {
        let mut feed = PageFeed::start(Arc::new(FailingSource), PageCursor::before(time("12:00")));
        assert!(matches!(
            feed.next().await,
            Err(SourceError::Http { status: 500, .. })
        ));
    }
}
