//! Route type.
//!
//! A `Route` is one way of travelling from origin to destination: a sequence
//! of legs with the transfers between them, plus any alerts that apply.

use chrono::Duration;

use super::{Delay, DomainError, Message, RouteLeg, StationId, Transfer, TransitTime};

/// A complete route from origin to destination.
///
/// # Invariants
///
/// - At least one leg
/// - Consecutive legs share a station (arrival of one = departure of next)
/// - Each leg departs no earlier than the previous one arrives
/// - `transfers` is `Departure`, one `Transfer` per change, `Arrival`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    legs: Vec<RouteLeg>,
    transfers: Vec<Transfer>,
    trip_alerts: Vec<Message>,
    vehicle_alerts: Vec<Message>,
    remarks: Vec<Message>,
}

impl Route {
    /// Construct a route from its legs, deriving the transfers.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there are no legs, consecutive legs don't share a
    /// station, or a leg departs before the previous one arrives.
    pub fn new(legs: Vec<RouteLeg>) -> Result<Self, DomainError> {
        let (first, last) = match (legs.first(), legs.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(DomainError::EmptyRoute),
        };

        let mut transfers = Vec::with_capacity(legs.len() + 1);
        transfers.push(Transfer::departure(first));

        for pair in legs.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            if from.arrival_station() != to.departure_station() {
                return Err(DomainError::StationsNotConnected(
                    from.arrival_station().clone(),
                    to.departure_station().clone(),
                ));
            }
            if to.departure_time() < from.arrival_time() {
                return Err(DomainError::InvalidRoute(
                    "leg departs before the previous leg arrives",
                ));
            }
            transfers.push(Transfer::between(from, to));
        }

        transfers.push(Transfer::arrival(last));

        Ok(Self {
            legs,
            transfers,
            trip_alerts: Vec::new(),
            vehicle_alerts: Vec::new(),
            remarks: Vec::new(),
        })
    }

    /// Attach alerts for the trips and vehicles ridden.
    pub fn with_alerts(mut self, trip_alerts: Vec<Message>, vehicle_alerts: Vec<Message>) -> Self {
        self.trip_alerts = trip_alerts;
        self.vehicle_alerts = vehicle_alerts;
        self
    }

    /// Attach planner remarks.
    pub fn with_remarks(mut self, remarks: Vec<Message>) -> Self {
        self.remarks = remarks;
        self
    }

    /// Returns the legs in travel order.
    pub fn legs(&self) -> &[RouteLeg] {
        &self.legs
    }

    /// Returns the transfers in travel order.
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Alerts published for the trips ridden.
    pub fn trip_alerts(&self) -> &[Message] {
        &self.trip_alerts
    }

    /// Alerts published for the routes (lines) ridden.
    pub fn vehicle_alerts(&self) -> &[Message] {
        &self.vehicle_alerts
    }

    /// Remarks added by the planner, e.g. for transfers at risk.
    pub fn remarks(&self) -> &[Message] {
        &self.remarks
    }

    fn first_leg(&self) -> &RouteLeg {
        // Non-empty by construction
        &self.legs[0]
    }

    fn last_leg(&self) -> &RouteLeg {
        &self.legs[self.legs.len() - 1]
    }

    /// Origin station.
    pub fn departure_station(&self) -> &StationId {
        self.first_leg().departure_station()
    }

    /// Destination station.
    pub fn arrival_station(&self) -> &StationId {
        self.last_leg().arrival_station()
    }

    /// Scheduled departure from the origin.
    pub fn departure_time(&self) -> TransitTime {
        self.first_leg().departure_time()
    }

    /// Scheduled arrival at the destination.
    pub fn arrival_time(&self) -> TransitTime {
        self.last_leg().arrival_time()
    }

    /// Delay on departure from the origin.
    pub fn departure_delay(&self) -> Delay {
        self.first_leg().departure().delay
    }

    /// Delay on arrival at the destination.
    pub fn arrival_delay(&self) -> Delay {
        self.last_leg().arrival().delay
    }

    /// Scheduled door-to-door duration.
    pub fn duration(&self) -> Duration {
        self.arrival_time()
            .signed_duration_since(self.departure_time())
    }

    /// Duration once delays are applied: each leg's delayed ride time plus
    /// the scheduled waits between legs.
    pub fn delay_adjusted_duration(&self) -> Duration {
        let riding = self
            .legs
            .iter()
            .fold(Duration::zero(), |acc, leg| acc + leg.delayed_duration());
        let waiting = self
            .transfers
            .iter()
            .fold(Duration::zero(), |acc, t| acc + t.wait_time());
        riding + waiting
    }

    /// Number of changes of vehicle.
    pub fn transfer_count(&self) -> usize {
        self.legs.len() - 1
    }

    /// Number of stations the route calls at, including both ends.
    pub fn station_count(&self) -> usize {
        self.legs
            .iter()
            .map(|leg| leg.connections().len())
            .sum::<usize>()
            + 1
    }

    /// Returns true if any leg end is cancelled.
    pub fn is_partially_canceled(&self) -> bool {
        self.legs.iter().any(RouteLeg::is_canceled)
    }
}
