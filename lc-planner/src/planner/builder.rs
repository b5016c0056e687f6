//! Route reconstruction from profiles.
//!
//! Every entry in the origin's profile is a distinct way of getting to the
//! destination. To turn one into a route, board its departure connection,
//! ride the trip up to its exit connection, and if that does not reach the
//! destination, look up how to continue from the station alighted at.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{Connection, DomainError, Route, RouteLeg, StationId, TransitTime, TripId};

use super::error::PlanError;
use super::policy::TransferTimePolicy;
use super::profile::{ProfileStore, StationStopProfile};
use super::rank::deduplicate;

/// Why one profile entry could not be turned into a route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The trip's successor links do not reach the exit connection
    #[error("trip {0} breaks off before its exit connection")]
    BrokenTrip(TripId),

    /// Nothing at the alighting station continues the route
    #[error("no continuation from {0}")]
    NoContinuation(StationId),

    /// The ridden connections do not form valid legs
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Rebuilds routes from a finished scan.
pub struct RouteBuilder<'a, P: ?Sized> {
    store: &'a ProfileStore,
    policy: &'a P,
    destination: &'a StationId,
    now: TransitTime,
}

impl<'a, P: TransferTimePolicy + ?Sized> RouteBuilder<'a, P> {
    /// Create a builder. `now` decides which leg ends count as passed.
    pub fn new(
        store: &'a ProfileStore,
        policy: &'a P,
        destination: &'a StationId,
        now: TransitTime,
    ) -> Self {
        Self {
            store,
            policy,
            destination,
            now,
        }
    }

    /// Build one route per entry of the origin's profile.
    ///
    /// Entries that cannot be rebuilt are skipped. Routes with the same
    /// departure, arrival and transfer count as an earlier one are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::NoRouteFound`] if the origin has no profile or no
    /// entry could be rebuilt.
    pub fn build_all(&self, origin: &StationId) -> Result<Vec<Route>, PlanError> {
        let Some(profile) = self.store.station(origin) else {
            return Err(PlanError::NoRouteFound);
        };

        let mut routes = Vec::with_capacity(profile.len());
        for entry in profile.entries() {
            match self.build(entry) {
                Ok(route) => routes.push(route),
                Err(e) => debug!(
                    departure = %entry.departure_connection.id,
                    error = %e,
                    "skipping profile entry"
                ),
            }
        }

        let routes = deduplicate(routes);
        if routes.is_empty() {
            return Err(PlanError::NoRouteFound);
        }
        Ok(routes)
    }

    /// Rebuild the route described by one profile entry.
    pub fn build(&self, entry: &StationStopProfile) -> Result<Route, BuildError> {
        let mut legs = Vec::with_capacity(entry.transfers + 1);
        let mut current = entry;

        loop {
            let ridden = self.ride(&current.departure_connection, &current.exit_connection)?;
            legs.push(RouteLeg::new(ridden, self.now)?);

            let alight = &current.exit_connection;
            if alight.arrival_station == *self.destination {
                break;
            }

            let station = &alight.arrival_station;
            let earliest = alight.arrival_time + self.policy.minimum_transfer_time(station);
            current = self
                .store
                .station(station)
                .and_then(|p| {
                    p.best_continuation(earliest, current.arrival_time, current.transfers)
                })
                .ok_or_else(|| BuildError::NoContinuation(station.clone()))?;
        }

        Ok(Route::new(legs)?)
    }

    /// The connections ridden from `board` up to and including `exit`.
    fn ride(
        &self,
        board: &Arc<Connection>,
        exit: &Arc<Connection>,
    ) -> Result<Vec<Arc<Connection>>, BuildError> {
        let mut ridden = vec![Arc::clone(board)];
        let mut at = board;

        while at.id != exit.id {
            if ridden.len() > self.store.link_count() {
                return Err(BuildError::BrokenTrip(board.trip.clone()));
            }
            at = self
                .store
                .next_on_trip(&at.id)
                .ok_or_else(|| BuildError::BrokenTrip(board.trip.clone()))?;
            ridden.push(Arc::clone(at));
        }

        Ok(ridden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, RouteId, TransferKind};
    use crate::planner::FixedTransferTime;
    use chrono::{Duration, NaiveDate};

    fn time(s: &str) -> TransitTime {
        TransitTime::parse_hhmm(s, NaiveDate::from_ymd_opt(2018, 8, 9).unwrap()).unwrap()
    }

    fn station(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    fn conn(id: &str, trip: &str, from: &str, to: &str, dep: &str, arr: &str) -> Arc<Connection> {
        Arc::new(Connection::new(
            ConnectionId::parse(id).unwrap(),
            station(from),
            station(to),
            time(dep),
            time(arr),
            TripId::parse(trip).unwrap(),
            RouteId::parse("r").unwrap(),
        ))
    }

    fn entry(
        board: &Arc<Connection>,
        exit: &Arc<Connection>,
        arrival: &str,
        transfers: usize,
    ) -> StationStopProfile {
        StationStopProfile {
            departure_time: board.departure_time,
            arrival_time: time(arrival),
            transfers,
            departure_connection: Arc::clone(board),
            exit_connection: Arc::clone(exit),
        }
    }

    fn policy() -> FixedTransferTime {
        FixedTransferTime(Duration::minutes(5))
    }

    #[test]
    fn rides_trip_to_exit() {
        let c1 = conn("c1", "t1", "A", "B", "10:00", "10:10");
        let c2 = conn("c2", "t1", "B", "C", "10:12", "10:30");
        let mut store = ProfileStore::new();
        store.link_trip(&c2);
        store.link_trip(&c1);
        store.insert_entry(&station("A"), entry(&c1, &c2, "10:30", 0));

        let destination = station("C");
        let policy = policy();
        let builder = RouteBuilder::new(&store, &policy, &destination, time("08:00"));
        let routes = builder.build_all(&station("A")).unwrap();

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].legs().len(), 1);
        assert_eq!(routes[0].legs()[0].connections().len(), 2);
        assert_eq!(routes[0].station_count(), 3);
    }

    #[test]
    fn continues_after_transfer() {
        let c1 = conn("c1", "t1", "A", "B", "10:00", "10:20");
        let c2 = conn("c2", "t2", "B", "C", "10:30", "11:00");
        let mut store = ProfileStore::new();
        store.link_trip(&c2);
        store.link_trip(&c1);
        store.insert_entry(&station("B"), entry(&c2, &c2, "11:00", 0));
        store.insert_entry(&station("A"), entry(&c1, &c1, "11:00", 1));

        let destination = station("C");
        let policy = policy();
        let builder = RouteBuilder::new(&store, &policy, &destination, time("08:00"));
        let route = builder.build_all(&station("A")).unwrap().remove(0);

        assert_eq!(route.legs().len(), 2);
        assert_eq!(route.transfer_count(), 1);
        assert_eq!(route.transfers()[1].kind(), TransferKind::Transfer);
        assert_eq!(route.transfers()[1].station(), &station("B"));
        assert_eq!(route.arrival_time(), time("11:00"));
    }

    #[test]
    fn missing_continuation_fails_entry() {
        let c1 = conn("c1", "t1", "A", "B", "10:00", "10:20");
        let mut store = ProfileStore::new();
        store.link_trip(&c1);
        let dangling = entry(&c1, &c1, "11:00", 1);

        let destination = station("C");
        let policy = policy();
        let builder = RouteBuilder::new(&store, &policy, &destination, time("08:00"));
        assert_eq!(
            builder.build(&dangling).unwrap_err(),
            BuildError::NoContinuation(station("B"))
        );
    }

    #[test]
    fn broken_trip_fails_entry() {
        let c1 = conn("c1", "t1", "A", "B", "10:00", "10:10");
        let c2 = conn("c2", "t1", "B", "C", "10:12", "10:30");
        let store = ProfileStore::new();

        let destination = station("C");
        let policy = policy();
        let builder = RouteBuilder::new(&store, &policy, &destination, time("08:00"));
        assert!(matches!(
            builder.build(&entry(&c1, &c2, "10:30", 0)),
            Err(BuildError::BrokenTrip(_))
        ));
    }

    #[test]
    fn no_origin_profile_is_no_route() {
        let store = ProfileStore::new();
        let destination = station("C");
        let policy = policy();
        let builder = RouteBuilder::new(&store, &policy, &destination, time("08:00"));
        assert_eq!(
            builder.build_all(&station("A")).unwrap_err(),
            PlanError::NoRouteFound
        );
    }
}
