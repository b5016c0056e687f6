//! Building liveboards from a connection source.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::domain::TransitTime;
use crate::fragments::{ConnectionSource, PageCursor, PageFeed};

use super::board::{BoardMode, Liveboard, LiveboardEntry, LiveboardQuery};
use super::error::LiveboardError;

/// Configuration for building liveboards.
#[derive(Debug, Clone)]
pub struct LiveboardConfig {
    /// How long before the window an arriving vehicle may have departed
    /// its previous stop (minutes).
    pub arrival_lookback_mins: i64,

    /// How many further windows to try when extending finds nothing.
    pub max_extensions: usize,

    /// Upper bound on pages read for one window.
    pub max_pages: usize,
}

impl LiveboardConfig {
    /// Returns the arrival lookback as a Duration.
    pub fn arrival_lookback(&self) -> Duration {
        Duration::minutes(self.arrival_lookback_mins)
    }
}

impl Default for LiveboardConfig {
    fn default() -> Self {
        Self {
            arrival_lookback_mins: 120,
            max_extensions: 8,
            max_pages: 200,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Extend {
    Later,
    Earlier,
}

/// Reads liveboards from a source.
pub struct LiveboardEngine<S> {
    source: Arc<S>,
    config: LiveboardConfig,
    now: Option<TransitTime>,
}

impl<S: ConnectionSource + 'static> LiveboardEngine<S> {
    pub fn new(source: Arc<S>, config: LiveboardConfig) -> Self {
        Self {
            source,
            config,
            now: None,
        }
    }

    /// Judge which events are already passed as of `now` instead of the
    /// wall clock.
    pub fn with_now(mut self, now: TransitTime) -> Self {
        self.now = Some(now);
        self
    }

    /// The departures or arrivals at the query's station in its window.
    ///
    /// # Errors
    ///
    /// - [`LiveboardError::EmptyWindow`] if the window is empty
    /// - [`LiveboardError::Source`] if a page could not be fetched
    pub async fn board(&self, query: &LiveboardQuery) -> Result<Liveboard, LiveboardError> {
        query.validate()?;
        let now = self.now.unwrap_or_else(TransitTime::now);

        // Pages are ordered by departure, so arrivals need a margin
        let earliest_departure = match query.mode {
            BoardMode::Departures => query.from,
            BoardMode::Arrivals => query.from - self.config.arrival_lookback(),
        };

        let mut feed = PageFeed::start(Arc::clone(&self.source), PageCursor::before(query.until));
        let mut entries = Vec::new();
        let mut pages = 0;

        while let Some(page) = feed.next().await? {
            pages += 1;
            entries.extend(
                page.connections
                    .iter()
                    .filter(|c| query.mode.lists(c, &query.station))
                    .filter(|c| query.contains(query.mode.event_time(c)))
                    .map(|c| LiveboardEntry::of(c, query.mode, now)),
            );

            if page
                .earliest_departure()
                .is_some_and(|earliest| earliest < earliest_departure)
            {
                break;
            }
            if pages >= self.config.max_pages {
                warn!(
                    station = %query.station,
                    pages,
                    "liveboard page limit reached, board may be incomplete"
                );
                break;
            }
        }

        let board = Liveboard::new(query, entries);
        debug!(
            station = %query.station,
            mode = query.mode.as_str(),
            from = %query.from.to_rfc3339(),
            until = %query.until.to_rfc3339(),
            pages,
            entries = board.len(),
            "liveboard built"
        );
        Ok(board)
    }

    /// Extend `board` with the results right after its window.
    ///
    /// Further windows are tried until one has results or
    /// [`LiveboardConfig::max_extensions`] is used up. The returned board
    /// covers the original window and every window tried.
    pub async fn next_results(&self, board: &Liveboard) -> Result<Liveboard, LiveboardError> {
        self.extend(board, Extend::Later).await
    }

    /// Extend `board` with the results right before its window.
    ///
    /// Works like [`next_results`](Self::next_results), going back in time.
    pub async fn previous_results(&self, board: &Liveboard) -> Result<Liveboard, LiveboardError> {
        self.extend(board, Extend::Earlier).await
    }

    async fn extend(
        &self,
        board: &Liveboard,
        direction: Extend,
    ) -> Result<Liveboard, LiveboardError> {
        let span = board.until().signed_duration_since(board.from());
        let mut extended = board.clone();

        // Every window tried is as long as the board's own
        for _ in 0..=self.config.max_extensions {
            let (from, until) = match direction {
                Extend::Later => (extended.until(), extended.until() + span),
                Extend::Earlier => (extended.from() - span, extended.from()),
            };
            let query = LiveboardQuery::new(board.station().clone(), board.mode(), from, until);
            let found = self.board(&query).await?;
            let found_any = !found.is_empty();
            extended = extended.merge(found);
            if found_any {
                return Ok(extended);
            }
        }

        debug!(
            station = %board.station(),
            ?direction,
            "no further liveboard results"
        );
        Ok(extended)
    }
}
