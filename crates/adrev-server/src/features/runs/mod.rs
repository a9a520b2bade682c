//! Runs feature module
//!
//! Read-only access to queued, running and finished feed runs.

pub mod routes;

pub use routes::runs_routes;
