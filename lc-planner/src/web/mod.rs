//! Web layer for the journey planner.
//!
//! Provides a health check and a JSON endpoint for planning journeys.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
