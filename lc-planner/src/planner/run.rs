//! A single planning run.
//!
//! A run walks the source backwards from the end of the scan window, feeding
//! pages to the scan engine while the next page is fetched in the
//! background. Once the scan is done, routes are rebuilt and assembled into
//! a journey. Runs can be cancelled between pages and give up at a deadline.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::alerts::AlertsProvider;
use crate::domain::{Journey, TransitTime};
use crate::fragments::{ConnectionSource, PageFeed};

use super::assemble::JourneyAssembler;
use super::builder::RouteBuilder;
use super::config::PlannerConfig;
use super::error::PlanError;
use super::policy::TransferTimePolicy;
use super::query::Query;
use super::scan::{ScanEngine, ScanWindow};

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Created, not started
    Idle,
    /// Waiting for the next page
    FetchingConnections,
    /// Scanning a page
    Scanning,
    /// Rebuilding and assembling routes
    Reconstructing,
    /// Finished with a journey
    Done,
    /// Finished with an error
    Error,
    /// Stopped by the caller
    Cancelled,
    /// Stopped at the deadline
    TimedOut,
}

impl RunState {
    /// Returns true once the run cannot change state any more.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Done | RunState::Error | RunState::Cancelled | RunState::TimedOut
        )
    }

    fn for_result(result: &Result<Journey, PlanError>) -> Self {
        match result {
            Ok(_) => RunState::Done,
            Err(PlanError::Cancelled) => RunState::Cancelled,
            Err(PlanError::Timeout) => RunState::TimedOut,
            Err(_) => RunState::Error,
        }
    }
}

/// Observes and cancels a run from elsewhere.
#[derive(Debug, Clone)]
pub struct RunHandle {
    state: watch::Receiver<RunState>,
    cancel: Arc<watch::Sender<bool>>,
}

impl RunHandle {
    /// Ask the run to stop. It returns [`PlanError::Cancelled`] within one
    /// page.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// The run's current state.
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Wait until the run reaches a terminal state, returning it.
    pub async fn finished(&mut self) -> RunState {
        match self.state.wait_for(RunState::is_terminal).await {
            Ok(state) => *state,
            // The run was dropped without finishing
            Err(_) => RunState::Cancelled,
        }
    }
}

/// One planning run over a source.
pub struct PlanningRun<S, P, A> {
    source: Arc<S>,
    policy: Arc<P>,
    alerts: Arc<A>,
    config: PlannerConfig,
    now: Option<TransitTime>,
    state: watch::Sender<RunState>,
    cancel: Arc<watch::Sender<bool>>,
}

impl<S, P, A> PlanningRun<S, P, A>
where
    S: ConnectionSource + 'static,
    P: TransferTimePolicy,
    A: AlertsProvider,
{
    /// Prepare a run. Nothing happens until [`plan`](Self::plan).
    pub fn new(source: Arc<S>, policy: Arc<P>, alerts: Arc<A>, config: PlannerConfig) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        let (cancel, _) = watch::channel(false);
        Self {
            source,
            policy,
            alerts,
            config,
            now: None,
            state,
            cancel: Arc::new(cancel),
        }
    }

    /// Judge which stops are already passed as of `now` instead of the
    /// wall clock at reconstruction.
    pub fn with_now(mut self, now: TransitTime) -> Self {
        self.now = Some(now);
        self
    }

    /// A handle to observe or cancel this run.
    pub fn handle(&self) -> RunHandle {
        RunHandle {
            state: self.state.subscribe(),
            cancel: Arc::clone(&self.cancel),
        }
    }

    /// Run the query to completion.
    ///
    /// # Errors
    ///
    /// - [`PlanError::InvalidQuery`] if the query is rejected up front
    /// - [`PlanError::NoRouteFound`] if the destination is out of reach
    /// - [`PlanError::Cancelled`] if a handle cancelled the run
    /// - [`PlanError::Timeout`] if the deadline passed while scanning
    /// - [`PlanError::Source`] if a page could not be fetched
    pub async fn plan(self, query: Query) -> Result<Journey, PlanError> {
        let result = self.execute(&query).await;
        let state = RunState::for_result(&result);
        self.set_state(state);

        match &result {
            Ok(journey) => info!(
                origin = %query.origin,
                destination = %query.destination,
                routes = journey.routes().len(),
                pages = journey.stats().pages_scanned,
                "planning finished"
            ),
            Err(e) => info!(
                origin = %query.origin,
                destination = %query.destination,
                ?state,
                error = %e,
                "planning failed"
            ),
        }

        result
    }

    fn set_state(&self, state: RunState) {
        self.state.send_replace(state);
    }

    async fn execute(&self, query: &Query) -> Result<Journey, PlanError> {
        query.validate()?;

        let deadline = Instant::now() + self.config.timeout();
        let window = ScanWindow::for_target(query.target);
        let mut engine = ScanEngine::new(query, window, self.policy.as_ref());
        let mut cancelled = self.cancel.subscribe();

        debug!(
            earliest = %window.earliest_departure.to_rfc3339(),
            latest = %window.latest_arrival.to_rfc3339(),
            "starting scan"
        );

        self.set_state(RunState::FetchingConnections);
        let mut feed = PageFeed::start(Arc::clone(&self.source), window.start_cursor());

        loop {
            let next = tokio::select! {
                biased;
                _ = cancelled.wait_for(|c| *c) => return Err(PlanError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => return Err(PlanError::Timeout),
                page = feed.next() => page?,
            };

            let Some(page) = next else {
                debug!("end of history");
                break;
            };

            self.set_state(RunState::Scanning);
            engine.scan_page(&page);
            if engine.should_stop() {
                break;
            }

            if *cancelled.borrow() {
                return Err(PlanError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Err(PlanError::Timeout);
            }
            self.set_state(RunState::FetchingConnections);
        }
        drop(feed);

        self.set_state(RunState::Reconstructing);
        let (store, stats) = engine.finish();

        let builder = RouteBuilder::new(
            &store,
            self.policy.as_ref(),
            &query.destination,
            self.now.unwrap_or_else(TransitTime::now),
        );
        let routes = builder.build_all(&query.origin)?;

        let assembler = JourneyAssembler::new(self.alerts.as_ref(), self.policy.as_ref());
        Ok(assembler.assemble(query, routes, stats).await)
    }
}
