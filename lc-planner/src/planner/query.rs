//! Planning queries.

use crate::domain::{StationId, TargetTime, TransitTime};

use super::config::PlannerConfig;
use super::error::QueryError;

/// What to plan: from where, to where, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Station to leave from.
    pub origin: StationId,

    /// Station to reach.
    pub destination: StationId,

    /// Departure or arrival constraint.
    pub target: TargetTime,

    /// Maximum number of routes to return.
    pub max_results: usize,

    /// Maximum number of transfers in any route.
    pub max_transfers: usize,
}

impl Query {
    /// Leave `origin` at or after `time`.
    pub fn depart_after(origin: StationId, destination: StationId, time: TransitTime) -> Self {
        Self::new(origin, destination, TargetTime::DepartAfter(time))
    }

    /// Reach `destination` at or before `time`.
    pub fn arrive_before(origin: StationId, destination: StationId, time: TransitTime) -> Self {
        Self::new(origin, destination, TargetTime::ArriveBefore(time))
    }

    fn new(origin: StationId, destination: StationId, target: TargetTime) -> Self {
        let defaults = PlannerConfig::default();
        Self {
            origin,
            destination,
            target,
            max_results: defaults.max_results,
            max_transfers: defaults.max_transfers,
        }
    }

    /// Set the maximum number of routes.
    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }

    /// Set the maximum number of transfers.
    pub fn with_max_transfers(mut self, n: usize) -> Self {
        self.max_transfers = n;
        self
    }

    /// Validate the query.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.origin == self.destination {
            return Err(QueryError::SameStation);
        }

        if self.max_results == 0 {
            return Err(QueryError::NoResultsRequested);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn station(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    fn ten() -> TransitTime {
        TransitTime::parse_hhmm("10:00", NaiveDate::from_ymd_opt(2018, 8, 9).unwrap()).unwrap()
    }

    #[test]
    fn builder_and_defaults() {
        let query = Query::depart_after(station("A"), station("B"), ten());
        assert_eq!(query.target, TargetTime::DepartAfter(ten()));
        assert_eq!(query.max_results, 5);
        assert_eq!(query.max_transfers, 4);

        let query = Query::arrive_before(station("A"), station("B"), ten())
            .with_max_results(2)
            .with_max_transfers(0);
        assert_eq!(query.target, TargetTime::ArriveBefore(ten()));
        assert_eq!(query.max_results, 2);
        assert_eq!(query.max_transfers, 0);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn same_station_is_invalid() {
        let query = Query::depart_after(station("A"), station("A"), ten());
        assert_eq!(query.validate(), Err(QueryError::SameStation));
    }

    #[test]
    fn zero_results_is_invalid() {
        let query = Query::depart_after(station("A"), station("B"), ten()).with_max_results(0);
        assert_eq!(query.validate(), Err(QueryError::NoResultsRequested));
    }
}
