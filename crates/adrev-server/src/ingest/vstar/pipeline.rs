//! VStar pipeline wiring

use std::sync::Arc;

use crate::db::ProcedureExecutor;
use crate::ingest::config::VStarConfig;
use crate::ingest::framework::{
    DedupFilter, FeedKind, FileFeedPipeline, ProcedureSink, RetryPolicy,
};
use crate::storage::ObjectStore;

use super::models::VStarRecord;
use super::parser::VStarDecoder;
use super::storage::PROCEDURES;

pub type VStarPipeline = FileFeedPipeline<VStarDecoder, ProcedureSink<VStarRecord>>;

/// Build the VStar pipeline over a Blob (or in-memory) store
pub fn build_pipeline(
    config: &VStarConfig,
    store: Arc<dyn ObjectStore>,
    executor: Arc<dyn ProcedureExecutor>,
    page_size: i32,
    retry: RetryPolicy,
) -> VStarPipeline {
    FileFeedPipeline::new(
        FeedKind::VStar,
        store,
        VStarDecoder::new(&config.network),
        ProcedureSink::new(executor, PROCEDURES),
    )
    .with_prefix(&config.prefix)
    .with_page_size(page_size)
    .with_filter(DedupFilter::any_extension())
    .with_retry(retry)
}
