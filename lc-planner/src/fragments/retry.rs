//! Retries with exponential backoff for flaky sources.

use std::time::Duration;

use tracing::warn;

use super::error::SourceError;
use super::page::{Page, PageCursor};
use super::source::ConnectionSource;

/// Retry policy for source fetches.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds).
    pub base_delay_ms: u64,

    /// Upper bound on any single delay (milliseconds).
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// Create a new retry policy.
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Delay before retry number `retry` (1 for the first retry), doubling
    /// each time up to the cap.
    pub fn backoff(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(16);
        let millis = self.base_delay_ms.saturating_mul(1_u64 << shift);
        Duration::from_millis(millis.min(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 5_000,
        }
    }
}

/// Connection source that retries retryable failures of another source.
///
/// Non-retryable errors (malformed pages, missing pages, client errors) are
/// returned immediately.
pub struct RetryingSource<S> {
    inner: S,
    config: RetryConfig,
}

impl<S: ConnectionSource> RetryingSource<S> {
    /// Wrap a source with a retry policy.
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Access the wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ConnectionSource> ConnectionSource for RetryingSource<S> {
    async fn next_page(&self, cursor: &PageCursor) -> Result<Option<Page>, SourceError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.inner.next_page(cursor).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.config.backoff(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "page fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransitTime;
    use std::sync::Mutex;

    /// Replays a scripted sequence of results.
    struct ScriptedSource {
        script: Mutex<Vec<Result<Option<Page>, SourceError>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedSource {
        fn new(mut script: Vec<Result<Option<Page>, SourceError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl ConnectionSource for ScriptedSource {
        async fn next_page(&self, _cursor: &PageCursor) -> Result<Option<Page>, SourceError> {
            *self.calls.lock().unwrap() += 1;
            self.script.lock().unwrap().pop().unwrap_or(Ok(None))
        }
    }

    fn cursor() -> PageCursor {
        PageCursor::before(TransitTime::parse_rfc3339("2018-08-09T10:00:00Z").unwrap())
    }

    fn fast() -> RetryConfig {
        RetryConfig::new(3, 1, 5)
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let config = RetryConfig::new(10, 100, 1_000);
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(400));
        assert_eq!(config.backoff(4), Duration::from_millis(800));
        assert_eq!(config.backoff(5), Duration::from_millis(1_000));
        assert_eq!(config.backoff(60), Duration::from_millis(1_000));
    }

    #[test]
    fn default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 250);
        assert_eq!(config.max_delay_ms, 5_000);
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let source = RetryingSource::new(
            ScriptedSource::new(vec![
                Err(SourceError::Unavailable("reset".into())),
                Ok(Some(Page::new("p", vec![], None))),
            ]),
            fast(),
        );

        let page = source.next_page(&cursor()).await.unwrap();
        assert!(page.is_some());
        assert_eq!(source.inner().call_count(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let source = RetryingSource::new(
            ScriptedSource::new(vec![
                Err(SourceError::Unavailable("1".into())),
                Err(SourceError::Unavailable("2".into())),
                Err(SourceError::Unavailable("3".into())),
                Ok(None),
            ]),
            fast(),
        );

        let err = source.next_page(&cursor()).await.unwrap_err();
        assert_eq!(err, SourceError::Unavailable("3".into()));
        assert_eq!(source.inner().call_count(), 3);
    }

    #[tokio::test]
    async fn permanent_errors_fail_fast() {
        let source = RetryingSource::new(
            ScriptedSource::new(vec![Err(SourceError::Malformed("bad".into()))]),
            fast(),
        );

        assert!(source.next_page(&cursor()).await.is_err());
        assert_eq!(source.inner().call_count(), 1);
    }
}
