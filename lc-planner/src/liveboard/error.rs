//! Liveboard error types.

use crate::fragments::SourceError;

/// Error from building a liveboard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiveboardError {
    /// The window does not end after it starts
    #[error("liveboard window must end after it starts")]
    EmptyWindow,

    /// The connection source failed
    #[error(transparent)]
    Source(#[from] SourceError),
}
