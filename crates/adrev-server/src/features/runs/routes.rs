//! Run status routes

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::ingest::{RunRecord, RunRegistry};

/// Create run routes
pub fn runs_routes() -> Router<Arc<RunRegistry>> {
    Router::new()
        .route("/", get(list_runs))
        .route("/:run_id", get(get_run))
}

/// List all runs, most recent first
///
/// GET /runs
async fn list_runs(State(registry): State<Arc<RunRegistry>>) -> Json<Vec<RunRecord>> {
    Json(registry.list())
}

/// Get one run
///
/// GET /runs/:run_id
async fn get_run(
    State(registry): State<Arc<RunRegistry>>,
    Path(run_id): Path<String>,
) -> Result<Json<RunRecord>, AppError> {
    let run_id: Uuid = run_id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid run id: {}", run_id)))?;

    registry
        .get(run_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("run {} not found", run_id)))
}
