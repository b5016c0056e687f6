//! Transfers between legs.
//!
//! Every route interleaves its legs with transfers: a `Departure` before the
//! first leg, a `Transfer` between each pair of legs, and an `Arrival` after
//! the last one.

use chrono::Duration;

use super::{Delay, RouteLeg, RouteLegEnd, StationId, TransitTime};

/// What a transfer stands for in the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferKind {
    /// First boarding at the origin
    Departure,
    /// Change of vehicle between two legs
    Transfer,
    /// Final alighting at the destination
    Arrival,
}

/// A point in a route where the passenger is not on board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    ends: Ends,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Ends {
    Departure(RouteLegEnd),
    Transfer {
        arrival: RouteLegEnd,
        departure: RouteLegEnd,
    },
    Arrival(RouteLegEnd),
}

impl Transfer {
    /// The first boarding of a route.
    pub fn departure(first: &RouteLeg) -> Self {
        Self {
            ends: Ends::Departure(first.departure().clone()),
        }
    }

    /// A change of vehicle from `from` to `to`.
    pub fn between(from: &RouteLeg, to: &RouteLeg) -> Self {
        Self {
            ends: Ends::Transfer {
                arrival: from.arrival().clone(),
                departure: to.departure().clone(),
            },
        }
    }

    /// The final alighting of a route.
    pub fn arrival(last: &RouteLeg) -> Self {
        Self {
            ends: Ends::Arrival(last.arrival().clone()),
        }
    }

    /// Returns the transfer kind.
    pub fn kind(&self) -> TransferKind {
        match self.ends {
            Ends::Departure(_) => TransferKind::Departure,
            Ends::Transfer { .. } => TransferKind::Transfer,
            Ends::Arrival(_) => TransferKind::Arrival,
        }
    }

    /// The leg end the passenger arrives with, absent for a `Departure`.
    pub fn arrival_end(&self) -> Option<&RouteLegEnd> {
        match &self.ends {
            Ends::Departure(_) => None,
            Ends::Transfer { arrival, .. } | Ends::Arrival(arrival) => Some(arrival),
        }
    }

    /// The leg end the passenger leaves with, absent for an `Arrival`.
    pub fn departure_end(&self) -> Option<&RouteLegEnd> {
        match &self.ends {
            Ends::Departure(departure) | Ends::Transfer { departure, .. } => Some(departure),
            Ends::Arrival(_) => None,
        }
    }

    /// The leg end that defines this transfer's station, time and delay:
    /// the outgoing one when there is one, else the incoming one.
    fn primary_end(&self) -> &RouteLegEnd {
        match &self.ends {
            Ends::Departure(departure) | Ends::Transfer { departure, .. } => departure,
            Ends::Arrival(arrival) => arrival,
        }
    }

    /// Station where the transfer happens.
    pub fn station(&self) -> &StationId {
        &self.primary_end().station
    }

    /// Scheduled time of the transfer.
    pub fn time(&self) -> TransitTime {
        self.primary_end().time
    }

    /// Delay applicable to the transfer.
    pub fn delay(&self) -> Delay {
        self.primary_end().delay
    }

    /// Expected time of the transfer.
    pub fn delayed_time(&self) -> TransitTime {
        self.primary_end().delayed_time()
    }

    /// Returns true if the applicable leg end is cancelled.
    pub fn is_canceled(&self) -> bool {
        self.primary_end().canceled
    }

    /// Scheduled wait between the two legs; zero unless this is a `Transfer`.
    pub fn wait_time(&self) -> Duration {
        match &self.ends {
            Ends::Transfer { arrival, departure } => {
                departure.time.signed_duration_since(arrival.time)
            }
            _ => Duration::zero(),
        }
    }

    /// Wait between the two legs once delays are applied.
    ///
    /// Only defined for `Transfer`; may be negative when the incoming
    /// vehicle is running later than the outgoing one.
    pub fn effective_transfer_time(&self) -> Option<Duration> {
        match &self.ends {
            Ends::Transfer { arrival, departure } => Some(
                departure
                    .delayed_time()
                    .signed_duration_since(arrival.delayed_time()),
            ),
            _ => None,
        }
    }

    /// Returns true when delays have eaten into the transfer so that less
    /// than `minimum` remains.
    pub fn is_at_risk(&self, minimum: Duration) -> bool {
        self.effective_transfer_time()
            .is_some_and(|effective| effective < minimum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Connection, ConnectionId, RouteId, TripId};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn time(s: &str) -> TransitTime {
        TransitTime::parse_hhmm(s, NaiveDate::from_ymd_opt(2018, 8, 9).unwrap()).unwrap()
    }

    fn leg(id: &str, from: &str, to: &str, dep: &str, arr: &str, arr_delay: i64) -> RouteLeg {
        let c = Connection::new(
            ConnectionId::parse(id).unwrap(),
            StationId::parse(from).unwrap(),
            StationId::parse(to).unwrap(),
            time(dep),
            time(arr),
            TripId::parse(id).unwrap(),
            RouteId::parse("r").unwrap(),
        )
        .with_delays(Delay::ZERO, Delay::from_mins(arr_delay));
        RouteLeg::new(vec![Arc::new(c)], time("00:00")).unwrap()
    }

    #[test]
    fn departure_and_arrival_ends() {
        let l = leg("t1", "A", "B", "10:00", "10:20", 0);

        let dep = Transfer::departure(&l);
        assert_eq!(dep.kind(), TransferKind::Departure);
        assert_eq!(dep.station().as_str(), "A");
        assert_eq!(dep.time(), time("10:00"));
        assert!(dep.arrival_end().is_none());
        assert_eq!(dep.wait_time(), Duration::zero());
        assert_eq!(dep.effective_transfer_time(), None);

        let arr = Transfer::arrival(&l);
        assert_eq!(arr.kind(), TransferKind::Arrival);
        assert_eq!(arr.station().as_str(), "B");
        assert_eq!(arr.time(), time("10:20"));
        assert!(arr.departure_end().is_none());
    }

    #[test]
    fn transfer_uses_outgoing_leg() {
        let l1 = leg("t1", "A", "B", "10:00", "10:20", 0);
        let l2 = leg("t2", "B", "C", "10:30", "11:00", 0);

        let t = Transfer::between(&l1, &l2);
        assert_eq!(t.kind(), TransferKind::Transfer);
        assert_eq!(t.station().as_str(), "B");
        assert_eq!(t.time(), time("10:30"));
        assert_eq!(t.wait_time(), Duration::minutes(10));
        assert_eq!(t.effective_transfer_time(), Some(Duration::minutes(10)));
        assert!(!t.is_at_risk(Duration::minutes(5)));
    }

    #[test]
    fn delay_puts_transfer_at_risk() {
        let l1 = leg("t1", "A", "B", "10:00", "10:20", 8);
        let l2 = leg("t2", "B", "C", "10:30", "11:00", 0);

        let t = Transfer::between(&l1, &l2);
        assert_eq!(t.wait_time(), Duration::minutes(10));
        assert_eq!(t.effective_transfer_time(), Some(Duration::minutes(2)));
        assert!(t.is_at_risk(Duration::minutes(5)));
    }

    #[test]
    fn missed_transfer_is_negative() {
        let l1 = leg("t1", "A", "B", "10:00", "10:20", 15);
        let l2 = leg("t2", "B", "C", "10:30", "11:00", 0);

        let t = Transfer::between(&l1, &l2);
        assert_eq!(t.effective_transfer_time(), Some(Duration::minutes(-5)));
    }
}
