//! Feature modules implementing the adrev API
//!
//! # Features
//!
//! - **feeds**: run triggers (`/feeds/:feed/run`)
//! - **runs**: run status (`/runs`, `/runs/:run_id`)
//!
//! Each feature module keeps its handlers and router in `routes.rs`.

pub mod feeds;
pub mod runs;

use axum::Router;

use crate::ingest::RunQueue;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Producer side of the run queue; also exposes the run registry
    pub queue: RunQueue,
}

/// Creates the main API router with all feature routes mounted
///
/// - `/feeds` - Run triggers
/// - `/runs` - Run status
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/feeds", feeds::feeds_routes().with_state(state.queue.clone()))
        .nest("/runs", runs::runs_routes().with_state(state.queue.registry()))
}
