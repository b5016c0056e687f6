//! Linked Connections journey planner.
//!
//! Answers "how do I get from A to B around this time?" by scanning
//! timetable connections, fetched a page at a time from a Linked
//! Connections server, with the Connection Scan Algorithm.

pub mod alerts;
pub mod domain;
pub mod fragments;
pub mod liveboard;
pub mod planner;
pub mod web;
