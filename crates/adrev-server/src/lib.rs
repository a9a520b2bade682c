//! Adrev Server Library
//!
//! Ad-revenue ingestion service. Pulls delivery reports from three external
//! feeds and upserts them into SQL Server through stored procedures.
//!
//! # Overview
//!
//! - **PlaceExchange**: daily CSV/XLSX exports in an S3 bucket
//! - **VStar**: CSV exports in an Azure Blob container
//! - **SpringServe**: JSON reporting API, one request per catch-up window
//!
//! File feeds share one pipeline: list, drop already-processed names, decode,
//! upsert row by row, mark the file processed, then commit the catch-up once.
//! The processed-filename set lives in the database and is the only state.
//!
//! # Architecture
//!
//! - [`ingest`]: pipeline framework, the three feeds, and the run queue
//! - [`storage`]: object-store trait with S3, Blob and in-memory backends
//! - [`db`]: stored-procedure executor over `tiberius`
//! - [`features`]: HTTP trigger and run-status routes
//! - [`secrets`]: credential lookup by name
//!
//! Runs are triggered over HTTP, queued, and executed one at a time by a
//! single background worker.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use adrev_server::{
//!     config::Config,
//!     ingest::{FeedRunner, IngestConfig, RunQueue},
//!     secrets::EnvSecretStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let runner = FeedRunner::connect(
//!         IngestConfig::from_env()?,
//!         &config.database.secret_name,
//!         &EnvSecretStore,
//!     )
//!     .await?;
//!
//!     let (queue, worker) = RunQueue::new(config.queue.capacity);
//!     worker.start(Arc::new(runner));
//!     queue.enqueue(adrev_server::ingest::FeedKind::VStar)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod secrets;
pub mod storage;

// Re-export commonly used types
pub use error::AppError;
