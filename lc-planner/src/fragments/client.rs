//! Linked Connections HTTP client.
//!
//! Fetches JSON-LD connection pages from a Linked Connections server,
//! following `hydra:previous` links backwards through the timetable.

use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tokio::sync::Semaphore;
use tracing::debug;

use super::error::SourceError;
use super::page::{Page, PageCursor};
use super::source::ConnectionSource;
use super::wire::parse_page;

/// Default server: the Belgian railway timetable published by iRail.
pub const DEFAULT_BASE_URL: &str = "https://graph.irail.be/sncb";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for the HTTP source.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL of the Linked Connections server
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl SourceConfig {
    /// Create a new config for the given server.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// HTTP connection source.
///
/// Uses a semaphore to limit concurrent requests so that prefetching runs
/// don't flood the server.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl HttpSource {
    /// Create a new HTTP source with the given configuration.
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/ld+json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// The URL to fetch for a cursor: the linked page if known, else a
    /// departure-time query.
    pub fn page_url(&self, cursor: &PageCursor) -> String {
        match &cursor.link {
            Some(link) => link.clone(),
            None => format!(
                "{}/connections?departureTime={}",
                self.base_url,
                cursor.before.to_rfc3339()
            ),
        }
    }
}

impl ConnectionSource for HttpSource {
    async fn next_page(&self, cursor: &PageCursor) -> Result<Option<Page>, SourceError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| SourceError::Unavailable("semaphore closed".to_string()))?;

        let url = self.page_url(cursor);
        debug!(%url, "fetching connections page");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let body = response.text().await?;
        let page = parse_page(&body, cursor.before)?;
        debug!(
            id = %page.id,
            connections = page.len(),
            has_previous = page.previous.is_some(),
            "decoded connections page"
        );

        Ok(Some(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransitTime;

    #[test]
    fn config_builder() {
        let config = SourceConfig::new("http://localhost:8080")
            .with_base_url("http://localhost:9090")
            .with_max_concurrent(10)
            .with_timeout(60);

        assert_eq!(config.base_url, "http://localhost:9090");
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn config_defaults() {
        let config = SourceConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn page_url_from_time() {
        let source = HttpSource::new(SourceConfig::new("http://localhost:8080/sncb/")).unwrap();
        let before = TransitTime::parse_rfc3339("2018-08-09T10:00:00Z").unwrap();
        assert_eq!(
            source.page_url(&PageCursor::before(before)),
            "http://localhost:8080/sncb/connections?departureTime=2018-08-09T10:00:00.000Z"
        );
    }

    #[test]
    fn page_url_follows_link() {
        let source = HttpSource::new(SourceConfig::default()).unwrap();
        let before = TransitTime::parse_rfc3339("2018-08-09T10:00:00Z").unwrap();
        let cursor = PageCursor::linked(before, "http://example.org/connections?page=7");
        assert_eq!(source.page_url(&cursor), "http://example.org/connections?page=7");
    }
}
