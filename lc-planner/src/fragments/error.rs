//! Connection source error types.

/// Errors from fetching or decoding connection pages.
///
/// Cloneable so that one failed fetch can be handed to every waiter on the
/// same page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The source could not be reached (network error, timeout, etc.)
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The server answered with an error status
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// The page could not be decoded
    #[error("malformed page: {0}")]
    Malformed(String),

    /// The requested page does not exist
    #[error("page not found: {0}")]
    NotFound(String),
}

impl SourceError {
    /// Returns true for failures worth retrying: connectivity problems,
    /// rate limiting and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Unavailable(_) => true,
            SourceError::Http { status, .. } => *status == 429 || *status >= 500,
            SourceError::Malformed(_) | SourceError::NotFound(_) => false,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => SourceError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => SourceError::Unavailable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SourceError::Unavailable("connection refused".into());
        assert_eq!(err.to_string(), "source unavailable: connection refused");

        let err = SourceError::Http {
            status: 503,
            message: "try later".into(),
        };
        assert_eq!(err.to_string(), "HTTP error 503: try later");

        let err = SourceError::Malformed("connection 3: missing field `gtfs:trip`".into());
        assert_eq!(
            err.to_string(),
            "malformed page: connection 3: missing field `gtfs:trip`"
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(SourceError::Unavailable("x".into()).is_retryable());
        assert!(
            SourceError::Http {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            SourceError::Http {
                status: 429,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !SourceError::Http {
                status: 400,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(!SourceError::Malformed("x".into()).is_retryable());
        assert!(!SourceError::NotFound("x".into()).is_retryable());
    }
}
