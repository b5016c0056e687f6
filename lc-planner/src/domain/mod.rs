//! Domain types for the journey planner.
//!
//! This module contains the core domain model types that represent
//! validated timetable data. All types enforce their invariants at
//! construction time, so code that receives these types can trust their
//! validity.

mod connection;
mod error;
mod ids;
mod journey;
mod leg;
mod message;
mod route;
mod time;
mod transfer;

pub use connection::{Connection, GtfsType};
pub use error::DomainError;
pub use ids::{ConnectionId, InvalidId, RouteId, StationId, TripId};
pub use journey::{Journey, ScanStats, TargetTime};
pub use leg::{RouteLeg, RouteLegEnd, Vehicle};
pub use message::Message;
pub use route::Route;
pub use time::{Delay, TimeError, TransitTime};
pub use transfer::{Transfer, TransferKind};
