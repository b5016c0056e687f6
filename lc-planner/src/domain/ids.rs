//! URI identifiers for stations, trips, routes and connections.
//!
//! Linked Connections identifies everything by URI. The identifier types
//! here are thin wrappers around a shared `Arc<str>`, so cloning one into a
//! profile entry or a route leg is a reference-count bump rather than an
//! allocation.

use std::fmt;
use std::sync::Arc;

/// Error returned when parsing an invalid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: &'static str,
}

macro_rules! uri_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Parse an identifier.
            ///
            /// The input must be non-empty and contain no whitespace.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                if s.is_empty() {
                    return Err(InvalidId {
                        kind: $kind,
                        reason: "must not be empty",
                    });
                }

                if s.chars().any(char::is_whitespace) {
                    return Err(InvalidId {
                        kind: $kind,
                        reason: "must not contain whitespace",
                    });
                }

                Ok(Self(Arc::from(s)))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

uri_id!(
    /// A station URI, e.g. `http://irail.be/stations/NMBS/008821006`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lc_planner::domain::StationId;
    ///
    /// let antwerp = StationId::parse("http://irail.be/stations/NMBS/008821006").unwrap();
    /// assert_eq!(antwerp.as_str(), "http://irail.be/stations/NMBS/008821006");
    ///
    /// assert!(StationId::parse("").is_err());
    /// assert!(StationId::parse("two words").is_err());
    /// ```
    StationId,
    "station id"
);

uri_id!(
    /// A trip URI (`gtfs:trip`): one run of one vehicle.
    TripId,
    "trip id"
);

uri_id!(
    /// A route URI (`gtfs:route`): the line a trip runs on.
    RouteId,
    "route id"
);

uri_id!(
    /// A connection URI (`@id`).
    ConnectionId,
    "connection id"
);
