//! Backward connection scan.
//!
//! Connections are fed latest-departure first. For each connection the scan
//! works out the best way to reach the destination after riding it, either
//! by getting off at the destination, by staying on the trip, or by changing
//! to something already known at its arrival station. The result is stored
//! in the departure station's profile and the trip's profile.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::domain::{Connection, ConnectionId, ScanStats, TargetTime, TransitTime};
use crate::fragments::{Page, PageCursor};

use super::policy::TransferTimePolicy;
use super::profile::{ProfileStore, StationStopProfile, TrainProfile};
use super::query::Query;

/// How far past the requested hour the scan looks.
///
/// Late evening and night services are sparse, so the window is wider then.
pub fn horizon(hour: u32) -> Duration {
    match hour {
        23 | 0 => Duration::hours(8),
        19..=22 | 1..=3 => Duration::hours(6),
        _ => Duration::hours(5),
    }
}

/// Bounds on the connections that can take part in a journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    /// Connections departing earlier are ignored; passing this ends the scan.
    pub earliest_departure: TransitTime,
    /// Connections arriving later are ignored.
    pub latest_arrival: TransitTime,
}

impl ScanWindow {
    /// Create a window with explicit bounds.
    pub fn new(earliest_departure: TransitTime, latest_arrival: TransitTime) -> Self {
        Self {
            earliest_departure,
            latest_arrival,
        }
    }

    /// The window for a query's time constraint.
    pub fn for_target(target: TargetTime) -> Self {
        match target {
            TargetTime::DepartAfter(t) => Self::new(t, t + horizon(t.hour())),
            TargetTime::ArriveBefore(t) => Self::new(t - horizon(t.hour()), t),
        }
    }

    /// Cursor for the first page: everything departing up to and including
    /// the latest useful arrival.
    pub fn start_cursor(&self) -> PageCursor {
        PageCursor::before(self.latest_arrival + Duration::seconds(1))
    }
}

/// A connection rejected as inconsistent data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWarning {
    /// Arrives before it departs
    NegativeDuration(ConnectionId),
    /// Departs later than the connection scanned before it
    OutOfOrder(ConnectionId),
    /// Departs from and arrives at the same station
    SameStation(ConnectionId),
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::NegativeDuration(id) => write!(f, "{id} arrives before it departs"),
            ScanWarning::OutOfOrder(id) => write!(f, "{id} is out of departure order"),
            ScanWarning::SameStation(id) => write!(f, "{id} departs from its arrival station"),
        }
    }
}

/// What scanning one page achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    /// Connections on the page.
    pub connections: usize,
    /// Connections that improved a station or trip profile.
    pub improvements: usize,
    /// Whether the earliest departure bound has been passed.
    pub passed_limit: bool,
}

/// The backward scan over one query.
pub struct ScanEngine<'a, P: ?Sized> {
    query: &'a Query,
    window: ScanWindow,
    policy: &'a P,
    store: ProfileStore,
    previous_departure: Option<TransitTime>,
    passed_limit: bool,
    last_page_improved: bool,
    warnings: Vec<ScanWarning>,
    stats: ScanStats,
}

impl<'a, P: TransferTimePolicy + ?Sized> ScanEngine<'a, P> {
    /// Start a scan for `query` over `window`.
    pub fn new(query: &'a Query, window: ScanWindow, policy: &'a P) -> Self {
        Self {
            query,
            window,
            policy,
            store: ProfileStore::new(),
            previous_departure: None,
            passed_limit: false,
            last_page_improved: false,
            warnings: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// The window being scanned.
    pub fn window(&self) -> ScanWindow {
        self.window
    }

    /// Profiles built so far.
    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Connections rejected so far.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Scan every connection of a page.
    pub fn scan_page(&mut self, page: &Page) -> PageOutcome {
        let mut improvements = 0;
        for c in &page.connections {
            if self.scan_connection(c) {
                improvements += 1;
            }
        }

        self.stats.pages_scanned += 1;
        if improvements > 0 {
            self.stats.improving_pages += 1;
        }
        self.last_page_improved = improvements > 0;

        debug!(
            page = %page.id,
            connections = page.len(),
            improvements,
            passed_limit = self.passed_limit,
            "scanned page"
        );

        PageOutcome {
            connections: page.len(),
            improvements,
            passed_limit: self.passed_limit,
        }
    }

    /// Scan one connection. Returns true if it improved any profile.
    pub fn scan_connection(&mut self, c: &Arc<Connection>) -> bool {
        self.stats.connections_scanned += 1;

        if let Err(warning) = self.validate(c) {
            warn!(%warning, "skipping connection");
            self.warnings.push(warning);
            self.stats.warnings += 1;
            return false;
        }

        if c.departure_time < self.window.earliest_departure {
            self.passed_limit = true;
            return false;
        }

        self.store.link_trip(c);

        if c.arrival_time > self.window.latest_arrival {
            return false;
        }

        if !c.allows_pickup() && !c.allows_drop_off() {
            return false;
        }

        let Some(best) = self.best_option(c) else {
            return false;
        };

        let mut improved = false;
        if self.can_board(c) {
            improved |= self.store.insert_entry(
                &c.departure_station,
                StationStopProfile {
                    departure_time: c.departure_time,
                    arrival_time: best.arrival_time,
                    transfers: best.transfers,
                    departure_connection: Arc::clone(c),
                    exit_connection: Arc::clone(&best.exit_connection),
                },
            );
        }
        improved |= self.store.update_train(&c.trip, best);
        improved
    }

    fn validate(&mut self, c: &Connection) -> Result<(), ScanWarning> {
        if self.previous_departure.is_some_and(|prev| c.departure_time > prev) {
            return Err(ScanWarning::OutOfOrder(c.id.clone()));
        }
        self.previous_departure = Some(c.departure_time);

        if c.arrival_time < c.departure_time {
            return Err(ScanWarning::NegativeDuration(c.id.clone()));
        }
        if c.departure_station == c.arrival_station {
            return Err(ScanWarning::SameStation(c.id.clone()));
        }
        Ok(())
    }

    fn can_board(&self, c: &Connection) -> bool {
        c.allows_pickup()
            && (c.departure_station != self.query.origin || c.pickup_type.is_regular())
    }

    /// Best of getting off at the destination, staying on, or changing.
    /// Ties go to the first of those.
    fn best_option(&self, c: &Arc<Connection>) -> Option<TrainProfile> {
        let destination = &self.query.destination;

        let alight = (c.arrival_station == *destination && c.drop_off_type.is_regular())
            .then(|| TrainProfile {
                arrival_time: c.arrival_time,
                transfers: 0,
                exit_connection: Arc::clone(c),
            });

        let stay = self.store.train(&c.trip).cloned();

        let change = if c.allows_drop_off()
            && c.arrival_station != *destination
            && self.query.max_transfers > 0
        {
            let earliest =
                c.arrival_time + self.policy.minimum_transfer_time(&c.arrival_station);
            self.store
                .station(&c.arrival_station)
                .and_then(|p| p.best_reachable(earliest, self.query.max_transfers - 1))
                .map(|entry| TrainProfile {
                    arrival_time: entry.arrival_time,
                    transfers: entry.transfers + 1,
                    exit_connection: Arc::clone(c),
                })
        } else {
            None
        };

        [alight, stay, change]
            .into_iter()
            .flatten()
            .min_by_key(|option| (option.arrival_time, option.transfers))
    }

    /// Whether to stop asking for earlier pages.
    pub fn should_stop(&self) -> bool {
        self.passed_limit && !self.last_page_improved
    }

    /// End the scan, handing over the profiles and counters.
    pub fn finish(self) -> (ProfileStore, ScanStats) {
        let mut stats = self.stats;
        stats.profile_entries = self.store.entry_count();
        (self.store, stats)
    }
}
