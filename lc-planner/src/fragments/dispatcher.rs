//! Correlation of page requests with their results.
//!
//! A planning run asks for pages in a fixed order but has them fetched by
//! background tasks, which may finish in any order. The dispatcher keeps one
//! pending slot per requested cursor; a fetch task resolves the slot for its
//! cursor and the run awaits the slots in the order it registered them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::trace;

use super::error::SourceError;
use super::page::{Page, PageCursor};

/// The outcome of one page fetch.
pub type PageResult = Result<Option<Page>, SourceError>;

/// Request-correlation table keyed by page cursor.
#[derive(Debug, Default)]
pub struct Dispatcher {
    pending: Mutex<HashMap<PageCursor, oneshot::Sender<PageResult>>>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<PageCursor, oneshot::Sender<PageResult>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register interest in the page for `cursor`.
    ///
    /// Registering a cursor twice replaces the earlier request, whose
    /// receiver then sees a closed channel.
    pub fn register(&self, cursor: PageCursor) -> oneshot::Receiver<PageResult> {
        let (tx, rx) = oneshot::channel();
        trace!(before = %cursor.before.to_rfc3339(), "registered page request");
        self.pending().insert(cursor, tx);
        rx
    }

    /// Deliver the result for `cursor`.
    ///
    /// Returns false if nobody is waiting for it any more (never registered,
    /// already resolved, cancelled, or the receiver was dropped).
    pub fn resolve(&self, cursor: &PageCursor, result: PageResult) -> bool {
        let Some(tx) = self.pending().remove(cursor) else {
            trace!(before = %cursor.before.to_rfc3339(), "dropping unmatched page result");
            return false;
        };
        tx.send(result).is_ok()
    }

    /// Drop every pending request. Their receivers see a closed channel.
    pub fn cancel_all(&self) {
        self.pending().clear();
    }

    /// Number of requests still waiting for a result.
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }
}
