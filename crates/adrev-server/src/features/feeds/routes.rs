//! Feed trigger routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::error::AppError;
use crate::ingest::{FeedKind, RunQueue};

/// Create feed routes
pub fn feeds_routes() -> Router<RunQueue> {
    Router::new().route("/:feed/run", get(trigger_run).post(trigger_run))
}

/// Queue a run of one feed
///
/// GET|POST /feeds/:feed/run
///
/// Answers `200 text/plain` as soon as the run is queued.
async fn trigger_run(
    State(queue): State<RunQueue>,
    Path(feed): Path<String>,
) -> Result<Response, AppError> {
    let feed: FeedKind = feed.parse().map_err(AppError::NotFound)?;
    let run_id = queue.enqueue(feed)?;

    Ok((StatusCode::OK, format!("{} run queued: {}", feed, run_id)).into_response())
}
