//! Planner error types.

use crate::fragments::SourceError;

/// A query that cannot be planned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Origin and destination are the same station
    #[error("origin and destination are the same station")]
    SameStation,

    /// The query asks for no routes at all
    #[error("max_results must be at least 1")]
    NoResultsRequested,
}

/// Error from a planning run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The query was rejected before scanning
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    /// The destination cannot be reached within the scan window
    #[error("no route found")]
    NoRouteFound,

    /// The run passed its deadline
    #[error("planning timed out")]
    Timeout,

    /// The run was cancelled by its caller
    #[error("planning cancelled")]
    Cancelled,

    /// The connection source failed
    #[error(transparent)]
    Source(#[from] SourceError),
}
