//! Domain error types.
//!
//! These errors represent validation failures and data inconsistencies
//! in the domain layer. They are distinct from source and planner errors.

use super::StationId;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Invalid leg construction (e.g., connections from two trips)
    #[error("invalid leg: {0}")]
    InvalidLeg(&'static str),

    /// Invalid route construction (e.g., legs overlapping in time)
    #[error("invalid route: {0}")]
    InvalidRoute(&'static str),

    /// Consecutive legs don't meet at a station
    #[error("stations {0} and {1} are not connected")]
    StationsNotConnected(StationId, StationId),

    /// Route has no legs
    #[error("route must have at least one leg")]
    EmptyRoute,
}
