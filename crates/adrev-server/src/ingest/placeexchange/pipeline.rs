//! PlaceExchange pipeline wiring

use std::sync::Arc;

use crate::db::ProcedureExecutor;
use crate::ingest::config::PlaceExchangeConfig;
use crate::ingest::framework::{
    DedupFilter, FeedKind, FileFeedPipeline, ProcedureSink, RetryPolicy,
};
use crate::storage::ObjectStore;

use super::models::PlaceExchangeRecord;
use super::parser::PlaceExchangeDecoder;
use super::storage::PROCEDURES;

/// Extensions PlaceExchange exports come in
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["csv", "xlsx"];

pub type PlaceExchangePipeline =
    FileFeedPipeline<PlaceExchangeDecoder, ProcedureSink<PlaceExchangeRecord>>;

/// Build the PlaceExchange pipeline over an S3 (or in-memory) store
pub fn build_pipeline(
    config: &PlaceExchangeConfig,
    store: Arc<dyn ObjectStore>,
    executor: Arc<dyn ProcedureExecutor>,
    page_size: i32,
    retry: RetryPolicy,
) -> PlaceExchangePipeline {
    FileFeedPipeline::new(
        FeedKind::PlaceExchange,
        store,
        PlaceExchangeDecoder::new(&config.organization, &config.filename_prefix),
        ProcedureSink::new(executor, PROCEDURES),
    )
    .with_prefix(&config.prefix)
    .with_page_size(page_size)
    .with_filter(DedupFilter::with_extensions(SUPPORTED_EXTENSIONS))
    .with_retry(retry)
}
