//! Journey planner using the Connection Scan Algorithm.
//!
//! This module answers: "what are the best ways to get from A to B around
//! this time?"
//!
//! Connections are scanned backwards in time. Every station collects a
//! profile of Pareto-optimal ways to reach the destination (departure time,
//! arrival time, transfers), and the origin's profile is then unfolded into
//! concrete routes with legs and transfers.

mod assemble;
mod builder;
mod config;
mod error;
mod policy;
mod profile;
mod query;
mod rank;
mod run;
mod scan;


pub use assemble::JourneyAssembler;
pub use builder::{BuildError, RouteBuilder};
pub use config::PlannerConfig;
pub use error::{PlanError, QueryError};
pub use policy::{FixedTransferTime, StationTransferTimes, TransferTimePolicy};
pub use profile::{ProfileStore, StationProfile, StationStopProfile, TrainProfile};
pub use query::Query;
pub use rank::{deduplicate, rank_routes};
pub use run::{PlanningRun, RunHandle, RunState};
pub use scan::{PageOutcome, ScanEngine, ScanWarning, ScanWindow, horizon};
