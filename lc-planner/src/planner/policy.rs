//! Minimum transfer times.

use std::collections::HashMap;

use chrono::Duration;

use crate::domain::StationId;

/// Decides how long a passenger needs to change trains at a station.
pub trait TransferTimePolicy: Send + Sync {
    /// Minimum time between arriving at `station` and departing from it on
    /// another trip.
    fn minimum_transfer_time(&self, station: &StationId) -> Duration;
}

/// The same minimum transfer time everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTransferTime(pub Duration);

impl TransferTimePolicy for FixedTransferTime {
    fn minimum_transfer_time(&self, _station: &StationId) -> Duration {
        self.0
    }
}

/// A default minimum transfer time with per-station overrides, for large
/// stations where platforms are far apart.
#[derive(Debug, Clone)]
pub struct StationTransferTimes {
    default: Duration,
    overrides: HashMap<StationId, Duration>,
}

impl StationTransferTimes {
    /// Use `default` at every station without an override.
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Override the minimum transfer time at one station.
    pub fn with_station(mut self, station: StationId, minimum: Duration) -> Self {
        self.overrides.insert(station, minimum);
        self
    }

    /// The default minimum transfer time.
    pub fn default_time(&self) -> Duration {
        self.default
    }
}

impl TransferTimePolicy for StationTransferTimes {
    fn minimum_transfer_time(&self, station: &StationId) -> Duration {
        self.overrides.get(station).copied().unwrap_or(self.default)
    }
}
