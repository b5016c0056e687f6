//! Station liveboards.
//!
//! This module answers: "what leaves from (or arrives at) this station in
//! the next half hour?"
//!
//! Boards are read from the same pages the planner scans, walking back from
//! the end of the window until no earlier page can hold a matching event.
//! A board can be extended to later or earlier results; extending keeps
//! going until something is found or the extension limit is hit.

mod board;
mod engine;
mod error;

pub use board::{BoardMode, DEFAULT_WINDOW_MINS, Liveboard, LiveboardEntry, LiveboardQuery};
pub use engine::{LiveboardConfig, LiveboardEngine};
pub use error::LiveboardError;
