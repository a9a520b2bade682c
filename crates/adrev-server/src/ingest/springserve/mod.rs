//! SpringServe feed
//!
//! Daily report rows pulled from the SpringServe reporting API rather than
//! from object storage. The only watermark is the last stored report day.

pub mod client;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use client::{ReportRequest, ReportSource, SpringServeClient, SpringServeCredentials};
pub use models::{CustomDimensions, SpringServeRecord};
pub use pipeline::{build_pipeline, report_window, SpringServePipeline};
