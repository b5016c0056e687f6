//! HTTP route handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::{
    Json, Router,
    extract::{Query as QueryString, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{debug, warn};

use crate::domain::{StationId, TransitTime};
use crate::liveboard::{BoardMode, LiveboardEngine, LiveboardError, LiveboardQuery};
use crate::planner::{PlanError, PlannerConfig, PlanningRun, Query};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/journey/plan", post(plan_journey))
        .route("/liveboard", get(liveboard))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Plan a journey between two stations.
async fn plan_journey(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<JourneyResponse>, AppError> {
    // Parse JSON manually so we can log the body on failure
    let req: PlanJourneyRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, body = %String::from_utf8_lossy(&body), "bad request body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })?;
    let query = parse_query(req, &state.config)?;

    // Only a few runs at a time; the rest wait briefly, then give up
    let permit = tokio::time::timeout(
        state.config.busy_wait(),
        Arc::clone(&state.runs).acquire_owned(),
    )
    .await
    .map_err(|_| AppError::Busy)?
    .map_err(|e| AppError::Internal {
        message: e.to_string(),
    })?;

    let run = PlanningRun::new(
        Arc::clone(&state.source),
        Arc::clone(&state.policy),
        Arc::clone(&state.alerts),
        state.config.as_ref().clone(),
    );
    let journey = run.plan(query).await?;
    drop(permit);

    Ok(Json(JourneyResponse::from_journey(&journey)))
}

/// Departures or arrivals at one station.
async fn liveboard(
    State(state): State<AppState>,
    params: Result<QueryString<LiveboardRequest>, QueryRejection>,
) -> Result<Json<LiveboardResponse>, AppError> {
    let QueryString(req) = params.map_err(|e| AppError::BadRequest {
        message: e.body_text(),
    })?;
    let (query, extend) = parse_liveboard_query(req)?;

    let permit = tokio::time::timeout(
        state.config.busy_wait(),
        Arc::clone(&state.runs).acquire_owned(),
    )
    .await
    .map_err(|_| AppError::Busy)?
    .map_err(|e| AppError::Internal {
        message: e.to_string(),
    })?;

    let engine = LiveboardEngine::new(
        Arc::clone(&state.source),
        state.liveboard.as_ref().clone(),
    );
    let build = async {
        let board = engine.board(&query).await?;
        match extend {
            None => Ok::<_, LiveboardError>(board),
            Some(BoardExtension::Next) => engine.next_results(&board).await,
            Some(BoardExtension::Previous) => engine.previous_results(&board).await,
        }
    };
    let board = tokio::time::timeout(state.config.timeout(), build)
        .await
        .map_err(|_| AppError::Timeout)??;
    drop(permit);

    Ok(Json(LiveboardResponse::from_board(&board)))
}

/// Which way to extend a liveboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoardExtension {
    Next,
    Previous,
}

fn parse_liveboard_query(
    req: LiveboardRequest,
) -> Result<(LiveboardQuery, Option<BoardExtension>), AppError> {
    let station = StationId::parse(&req.station).map_err(|e| AppError::BadRequest {
        message: format!("Invalid station {:?}: {e}", req.station),
    })?;

    let mode = match req.mode.as_deref() {
        None => BoardMode::Departures,
        Some(m) => BoardMode::parse(m).ok_or_else(|| AppError::BadRequest {
            message: format!("Invalid mode {m:?}, expected departures or arrivals"),
        })?,
    };

    let extend = match req.extend.as_deref() {
        None => None,
        Some("next") => Some(BoardExtension::Next),
        Some("previous") => Some(BoardExtension::Previous),
        Some(other) => {
            return Err(AppError::BadRequest {
                message: format!("Invalid extend {other:?}, expected next or previous"),
            });
        }
    };

    let from = match req.from.as_deref() {
        Some(t) => parse_time(t)?,
        None => TransitTime::now(),
    };
    let query = match req.until.as_deref() {
        Some(t) => LiveboardQuery::new(station, mode, from, parse_time(t)?),
        None => LiveboardQuery::starting_at(station, mode, from),
    };

    Ok((query, extend))
}

/// Turn a request into a planner query, filling in configured defaults.
fn parse_query(req: PlanJourneyRequest, config: &PlannerConfig) -> Result<Query, AppError> {
    let origin = StationId::parse(&req.from).map_err(|e| AppError::BadRequest {
        message: format!("Invalid origin {:?}: {e}", req.from),
    })?;
    let destination = StationId::parse(&req.to).map_err(|e| AppError::BadRequest {
        message: format!("Invalid destination {:?}: {e}", req.to),
    })?;

    let query = match (req.departure_time.as_deref(), req.arrival_time.as_deref()) {
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest {
                message: "Give either departure_time or arrival_time, not both".to_string(),
            });
        }
        (Some(t), None) => Query::depart_after(origin, destination, parse_time(t)?),
        (None, Some(t)) => Query::arrive_before(origin, destination, parse_time(t)?),
        (None, None) => Query::depart_after(origin, destination, TransitTime::now()),
    };

    Ok(query
        .with_max_results(req.max_results.unwrap_or(config.max_results))
        .with_max_transfers(req.max_transfers.unwrap_or(config.max_transfers)))
}

fn parse_time(s: &str) -> Result<TransitTime, AppError> {
    TransitTime::parse_rfc3339(s).map_err(|e| AppError::BadRequest {
        message: format!("Invalid time {s:?}: {e}"),
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Busy,
    Timeout,
    Upstream { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::InvalidQuery(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            PlanError::NoRouteFound => AppError::NotFound {
                message: e.to_string(),
            },
            PlanError::Timeout => AppError::Timeout,
            PlanError::Source(_) => AppError::Upstream {
                message: e.to_string(),
            },
            PlanError::Cancelled => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<LiveboardError> for AppError {
    fn from(e: LiveboardError) -> Self {
        match e {
            LiveboardError::EmptyWindow => AppError::BadRequest {
                message: e.to_string(),
            },
            LiveboardError::Source(_) => AppError::Upstream {
                message: e.to_string(),
            },
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Upstream { message }
            | AppError::Internal { message } => message.clone(),
            AppError::Busy => "planner busy, try again shortly".to_string(),
            AppError::Timeout => "planning timed out".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            warn!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
