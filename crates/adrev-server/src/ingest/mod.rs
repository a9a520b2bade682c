//! Feed ingestion
//!
//! # Architecture
//!
//! - **framework**: lister, dedup filter, decoder and sink traits, and the
//!   generic file pipeline shared by the file feeds
//! - **placeexchange**: S3 CSV/XLSX exports
//! - **vstar**: Azure Blob CSV exports
//! - **springserve**: reporting API pulls
//! - **config**: `INGEST_*` and per-feed environment variables
//! - **runner**: builds a feed's pipeline from its source and runs it
//! - **jobs** / **queue**: run requests, the single run worker, and the
//!   in-memory run registry
//!
//! # Public API
//!
//! The HTTP surface lives in `features::feeds` and `features::runs`:
//! - `GET|POST /api/v1/feeds/:feed/run` - queue a run
//! - `GET /api/v1/runs` - list runs
//! - `GET /api/v1/runs/:run_id` - one run

pub mod config;
pub mod framework;
pub mod jobs;
pub mod placeexchange;
pub mod queue;
pub mod runner;
pub mod springserve;
pub mod vstar;

pub use config::{IngestConfig, PlaceExchangeConfig, SpringServeConfig, VStarConfig};
pub use framework::{FeedKind, RunStats, Watermark};
pub use jobs::{FeedRunJob, RunRecord, RunStatus};
pub use queue::{EnqueueError, FeedExecutor, RunQueue, RunRegistry, RunWorker};
pub use runner::{FeedRunner, Pending};
