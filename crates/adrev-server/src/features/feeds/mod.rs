//! Feeds feature module
//!
//! Run triggers. A trigger only queues the run; progress is read from the
//! runs feature.

pub mod routes;

#[cfg(test)]
mod routes_test;

pub use routes::feeds_routes;
