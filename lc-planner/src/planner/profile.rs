//! Profiles built during the backward scan.
//!
//! Each station keeps a list of Pareto-optimal ways to reach the destination
//! from it, one per departure option, ordered by descending departure time.
//! Each trip keeps the best arrival known for a passenger already on board.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::domain::{Connection, ConnectionId, StationId, TransitTime, TripId};

/// One way of reaching the destination from a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationStopProfile {
    /// When the first connection leaves this station.
    pub departure_time: TransitTime,
    /// When the destination is reached.
    pub arrival_time: TransitTime,
    /// Number of trip changes on the way.
    pub transfers: usize,
    /// The connection boarded here.
    pub departure_connection: Arc<Connection>,
    /// The connection of the boarded trip to alight from.
    pub exit_connection: Arc<Connection>,
}

impl StationStopProfile {
    /// Returns true if `self` is at least as good as `other` in every
    /// respect: departs no earlier, arrives no later, transfers no more.
    pub fn dominates(&self, other: &Self) -> bool {
        self.departure_time >= other.departure_time
            && self.arrival_time <= other.arrival_time
            && self.transfers <= other.transfers
    }

    fn rank_key(&self) -> (TransitTime, usize, Reverse<TransitTime>) {
        (self.arrival_time, self.transfers, Reverse(self.departure_time))
    }
}

/// The profile of one station.
///
/// # Invariants
///
/// - Entries are in non-increasing departure order
/// - No entry dominates another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationProfile {
    entries: Vec<StationStopProfile>,
}

impl StationProfile {
    /// Entries, latest departure first.
    pub fn entries(&self) -> &[StationStopProfile] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the station cannot reach the destination yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a candidate unless an existing entry dominates it.
    ///
    /// Existing entries the candidate dominates are removed. Returns true if
    /// the candidate was stored.
    pub fn insert(&mut self, candidate: StationStopProfile) -> bool {
        if self.entries.iter().any(|e| e.dominates(&candidate)) {
            return false;
        }

        self.entries.retain(|e| !candidate.dominates(e));
        let at = self
            .entries
            .partition_point(|e| e.departure_time >= candidate.departure_time);
        self.entries.insert(at, candidate);
        true
    }

    /// The best entry departing at or after `earliest` with at most
    /// `max_transfers` transfers: earliest arrival, then fewest transfers,
    /// then latest departure.
    pub fn best_reachable(
        &self,
        earliest: TransitTime,
        max_transfers: usize,
    ) -> Option<&StationStopProfile> {
        self.departing_from(earliest)
            .filter(|e| e.transfers <= max_transfers)
            .min_by_key(|e| e.rank_key())
    }

    /// Like [`best_reachable`](Self::best_reachable), restricted to entries
    /// arriving by `latest_arrival` with fewer than `below_transfers`
    /// transfers. Used to continue a route after alighting.
    pub fn best_continuation(
        &self,
        earliest: TransitTime,
        latest_arrival: TransitTime,
        below_transfers: usize,
    ) -> Option<&StationStopProfile> {
        self.departing_from(earliest)
            .filter(|e| e.arrival_time <= latest_arrival && e.transfers < below_transfers)
            .min_by_key(|e| e.rank_key())
    }

    fn departing_from(
        &self,
        earliest: TransitTime,
    ) -> impl Iterator<Item = &StationStopProfile> + '_ {
        self.entries
            .iter()
            .take_while(move |e| e.departure_time >= earliest)
    }
}

/// Best known outcome for a passenger already riding a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainProfile {
    /// When the destination is reached.
    pub arrival_time: TransitTime,
    /// Number of trip changes still to come.
    pub transfers: usize,
    /// The connection of this trip to alight from.
    pub exit_connection: Arc<Connection>,
}

impl TrainProfile {
    fn is_better_than(&self, other: &Self) -> bool {
        (self.arrival_time, self.transfers) < (other.arrival_time, other.transfers)
    }
}

/// All profiles of one planning run.
#[derive(Debug, Default)]
pub struct ProfileStore {
    stations: HashMap<StationId, StationProfile>,
    trips: HashMap<TripId, TrainProfile>,
    next_on_trip: HashMap<ConnectionId, Arc<Connection>>,
    last_on_trip: HashMap<TripId, Arc<Connection>>,
}

impl ProfileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The profile of a station, if it has any entries.
    pub fn station(&self, station: &StationId) -> Option<&StationProfile> {
        self.stations.get(station).filter(|p| !p.is_empty())
    }

    /// Offer an entry to a station's profile. Returns true if stored.
    pub fn insert_entry(&mut self, station: &StationId, entry: StationStopProfile) -> bool {
        self.stations
            .entry(station.clone())
            .or_default()
            .insert(entry)
    }

    /// The best known outcome of staying on `trip`.
    pub fn train(&self, trip: &TripId) -> Option<&TrainProfile> {
        self.trips.get(trip)
    }

    /// Record `profile` for `trip` if there is none yet or it is strictly
    /// better. Returns true if stored.
    pub fn update_train(&mut self, trip: &TripId, profile: TrainProfile) -> bool {
        match self.trips.get_mut(trip) {
            Some(existing) if !profile.is_better_than(existing) => false,
            Some(existing) => {
                *existing = profile;
                true
            }
            None => {
                self.trips.insert(trip.clone(), profile);
                true
            }
        }
    }

    /// Record `connection` as the new earliest known connection of its trip,
    /// linking it to the one scanned before it.
    ///
    /// A connection seen again (the same id twice in a row) is not linked to
    /// itself.
    pub fn link_trip(&mut self, connection: &Arc<Connection>) {
        if let Some(later) = self
            .last_on_trip
            .insert(connection.trip.clone(), Arc::clone(connection))
        {
            if later.id != connection.id {
                self.next_on_trip.insert(connection.id.clone(), later);
            }
        }
    }

    /// Number of trip successor links.
    pub fn link_count(&self) -> usize {
        self.next_on_trip.len()
    }

    /// The connection following `id` on the same trip.
    pub fn next_on_trip(&self, id: &ConnectionId) -> Option<&Arc<Connection>> {
        self.next_on_trip.get(id)
    }

    /// Total number of station profile entries.
    pub fn entry_count(&self) -> usize {
        self.stations.values().map(StationProfile::len).sum()
    }

    /// A sorted copy of all non-empty station profiles, for comparison.
    pub fn snapshot(&self) -> BTreeMap<StationId, StationProfile> {
        self.stations
            .iter()
            .filter(|(_, p)| !p.is_empty())
            .map(|(s, p)| (s.clone(), p.clone()))
            .collect()
    }
}
