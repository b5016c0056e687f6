//! Linked Connections page sources.
//!
//! Everything the planner reads comes through [`ConnectionSource`]: pages of
//! connections, newest first, each pointing at the next-earlier page. The
//! adapters here serve pages from memory, from JSON-LD files or from a live
//! server, optionally behind a cache and a retry policy.

mod cache;
mod client;
mod directory;
mod dispatcher;
mod error;
mod feed;
mod page;
mod retry;
mod source;
mod wire;

pub use cache::{CacheConfig, CachedSource};
pub use client::{DEFAULT_BASE_URL, HttpSource, SourceConfig};
pub use directory::DirectorySource;
pub use dispatcher::{Dispatcher, PageResult};
pub use error::SourceError;
pub use feed::PageFeed;
pub use page::{Page, PageCursor};
pub use retry::{RetryConfig, RetryingSource};
pub use source::{ConnectionSource, DEFAULT_PAGE_SIZE, MemorySource};
pub use wire::{parse_connections, parse_page};

/// The live source stack: cache in front of retries in front of HTTP.
pub type LiveSource = CachedSource<RetryingSource<HttpSource>>;

/// A source chosen at startup.
pub enum ConfiguredSource {
    /// A live Linked Connections server
    Http(LiveSource),
    /// JSON-LD files on disk
    Directory(DirectorySource),
    /// Connections held in memory
    Memory(MemorySource),
}

impl ConfiguredSource {
    /// Build the live stack for a server.
    pub fn http(
        config: SourceConfig,
        retry: RetryConfig,
        cache: &CacheConfig,
    ) -> Result<Self, SourceError> {
        let http = HttpSource::new(config)?;
        Ok(Self::Http(CachedSource::new(
            RetryingSource::new(http, retry),
            cache,
        )))
    }

    /// Short name of the source kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfiguredSource::Http(_) => "http",
            ConfiguredSource::Directory(_) => "directory",
            ConfiguredSource::Memory(_) => "memory",
        }
    }
}

impl ConnectionSource for ConfiguredSource {
    async fn next_page(&self, cursor: &PageCursor) -> Result<Option<Page>, SourceError> {
        match self {
            ConfiguredSource::Http(source) => source.next_page(cursor).await,
            ConfiguredSource::Directory(source) => source.next_page(cursor).await,
            ConfiguredSource::Memory(source) => source.next_page(cursor).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Connection, ConnectionId, RouteId, StationId, TransitTime, TripId};
    use chrono::Duration;

    #[tokio::test]
    async fn configured_memory_source_delegates() {
        let dep = TransitTime::parse_rfc3339("2018-08-09T10:00:00Z").unwrap();
        let connection = Connection::new(
            ConnectionId::parse("c1").unwrap(),
            StationId::parse("A").unwrap(),
            StationId::parse("B").unwrap(),
            dep,
            dep + Duration::minutes(10),
            TripId::parse("t1").unwrap(),
            RouteId::parse("r1").unwrap(),
        );
        let source = ConfiguredSource::Memory(MemorySource::new(vec![connection], 10));
        assert_eq!(source.kind(), "memory");

        let page = source
            .next_page(&PageCursor::before(dep + Duration::hours(1)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn configured_http_source_builds() {
        let source = ConfiguredSource::http(
            SourceConfig::default(),
            RetryConfig::default(),
            &CacheConfig::default(),
        )
        .unwrap();
        assert_eq!(source.kind(), "http");
    }
}
