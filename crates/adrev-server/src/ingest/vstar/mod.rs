//! VStar feed
//!
//! CSV exports in an Azure Blob container with a fixed 13-column layout.
//! Rows are kept when their network matches the configured marker.

pub mod models;
pub mod parser;
pub mod pipeline;
pub mod storage;

pub use models::VStarRecord;
pub use parser::VStarDecoder;
pub use pipeline::{build_pipeline, VStarPipeline};
pub use storage::PROCEDURES;
