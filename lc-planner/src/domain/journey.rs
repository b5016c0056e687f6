//! Journey types.
//!
//! A `Journey` is the answer to one planning query: the ranked routes from
//! origin to destination for a requested departure or arrival time, along
//! with counters describing how much of the timetable was scanned.

use super::{Route, StationId, TransitTime};

/// The time constraint of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetTime {
    /// Leave the origin at or after this time.
    DepartAfter(TransitTime),
    /// Reach the destination at or before this time.
    ArriveBefore(TransitTime),
}

impl TargetTime {
    /// The requested instant, whichever side it constrains.
    pub fn time(&self) -> TransitTime {
        match self {
            TargetTime::DepartAfter(t) | TargetTime::ArriveBefore(t) => *t,
        }
    }

    /// Returns true for a depart-after query.
    pub fn is_depart_after(&self) -> bool {
        matches!(self, TargetTime::DepartAfter(_))
    }
}

/// Counters collected while scanning the timetable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Pages fed to the scan.
    pub pages_scanned: usize,
    /// Connections looked at, usable or not.
    pub connections_scanned: usize,
    /// Connections rejected as inconsistent data.
    pub warnings: usize,
    /// Profile entries stored across all stations at the end of the scan.
    pub profile_entries: usize,
    /// Pages that improved at least one profile.
    pub improving_pages: usize,
}

/// The planned routes for one query.
///
/// # Invariants
///
/// - Every route departs from `origin` and arrives at `destination`
/// - Routes are ranked best-first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    origin: StationId,
    destination: StationId,
    target: TargetTime,
    routes: Vec<Route>,
    stats: ScanStats,
}

impl Journey {
    /// Package ranked routes for a query.
    pub fn new(
        origin: StationId,
        destination: StationId,
        target: TargetTime,
        routes: Vec<Route>,
        stats: ScanStats,
    ) -> Self {
        Self {
            origin,
            destination,
            target,
            routes,
            stats,
        }
    }

    /// Requested origin.
    pub fn origin(&self) -> &StationId {
        &self.origin
    }

    /// Requested destination.
    pub fn destination(&self) -> &StationId {
        &self.destination
    }

    /// Requested time constraint.
    pub fn target(&self) -> TargetTime {
        self.target
    }

    /// Routes, best first.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The top-ranked route, if any.
    pub fn best(&self) -> Option<&Route> {
        self.routes.first()
    }

    /// Scan counters.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn target_time_accessors() {
        let t = TransitTime::parse_hhmm("10:00", NaiveDate::from_ymd_opt(2018, 8, 9).unwrap())
            .unwrap();

        let after = TargetTime::DepartAfter(t);
        assert!(after.is_depart_after());
        assert_eq!(after.time(), t);

        let before = TargetTime::ArriveBefore(t);
        assert!(!before.is_depart_after());
        assert_eq!(before.time(), t);
    }

    #[test]
    fn empty_journey() {
        let t = TransitTime::parse_hhmm("10:00", NaiveDate::from_ymd_opt(2018, 8, 9).unwrap())
            .unwrap();
        let journey = Journey::new(
            StationId::parse("A").unwrap(),
            StationId::parse("B").unwrap(),
            TargetTime::DepartAfter(t),
            vec![],
            ScanStats::default(),
        );
        assert!(journey.best().is_none());
        assert_eq!(journey.stats().pages_scanned, 0);
    }
}
