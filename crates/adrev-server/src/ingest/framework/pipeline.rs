//! Generic file feed pipeline
//!
//! Lister -> dedup filter -> decoder -> sink, one object at a time, then one
//! commit-catchup call. Run-scope failures (listing, finalize) return `Err`;
//! object- and row-scope failures are logged, counted in [`RunStats`], and
//! skipped.

use adrev_common::Result;
use futures::TryStreamExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::storage::{ObjectStore, SourceObject};

use super::decoder::RecordDecoder;
use super::dedup::{Admission, DedupFilter};
use super::lister::{list_objects, DEFAULT_PAGE_SIZE};
use super::retry::RetryPolicy;
use super::sink::FeedSink;
use super::types::{FeedKind, FeedRunOutcome, RunStats, Watermark};

pub struct FileFeedPipeline<D, S> {
    feed: FeedKind,
    store: Arc<dyn ObjectStore>,
    prefix: String,
    page_size: i32,
    filter: DedupFilter,
    retry: RetryPolicy,
    decoder: D,
    sink: S,
}

impl<D, S> FileFeedPipeline<D, S>
where
    D: RecordDecoder,
    S: FeedSink<Record = D::Record>,
{
    pub fn new(feed: FeedKind, store: Arc<dyn ObjectStore>, decoder: D, sink: S) -> Self {
        Self {
            feed,
            store,
            prefix: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            filter: DedupFilter::any_extension(),
            retry: RetryPolicy::default(),
            decoder,
            sink,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_filter(mut self, filter: DedupFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn feed(&self) -> FeedKind {
        self.feed
    }

    /// Read the processed-file set from the sink
    pub async fn load_watermark(&self) -> Result<Watermark> {
        self.sink.load_watermark().await
    }

    /// Load the watermark, then run
    pub async fn run_once(&self) -> Result<FeedRunOutcome> {
        let watermark = self.load_watermark().await?;
        self.run(watermark).await
    }

    /// Ingest every admitted object, then finalize
    ///
    /// Returns the counters and `watermark` extended with every object
    /// marked processed during this run.
    pub async fn run(&self, mut watermark: Watermark) -> Result<FeedRunOutcome> {
        let mut stats = RunStats::new(self.feed);
        info!(
            feed = %self.feed,
            container = self.store.container(),
            prefix = %self.prefix,
            processed = watermark.len(),
            "Starting feed run"
        );

        let mut objects = std::pin::pin!(list_objects(
            self.store.as_ref(),
            &self.prefix,
            self.page_size
        ));

        while let Some(object) = objects.try_next().await? {
            stats.objects_listed += 1;

            match self.filter.admit(&watermark, &object) {
                Admission::Accept => {},
                Admission::AlreadyProcessed => {
                    debug!(key = %object.key, "Skipping already processed object");
                    stats.objects_skipped += 1;
                    continue;
                },
                Admission::UnsupportedExtension => {
                    debug!(key = %object.key, "Skipping object with unsupported extension");
                    stats.objects_skipped += 1;
                    continue;
                },
            }

            if self.ingest_object(&object, &mut stats).await {
                watermark.insert(object.key.clone());
            }
        }

        if let Err(e) = self.sink.commit_catchup().await {
            error!(feed = %self.feed, error = %e, "Commit catchup failed");
            return Err(e);
        }

        stats.complete();
        info!(
            feed = %self.feed,
            listed = stats.objects_listed,
            skipped = stats.objects_skipped,
            processed = stats.objects_processed,
            failed = stats.objects_failed,
            upserted = stats.rows_upserted,
            rows_failed = stats.rows_failed,
            duration_secs = stats.duration_secs,
            "Feed run complete"
        );

        Ok(FeedRunOutcome { stats, watermark })
    }

    /// Objects the dedup filter would admit, without downloading anything
    pub async fn pending(&self, watermark: &Watermark) -> Result<Vec<SourceObject>> {
        list_objects(self.store.as_ref(), &self.prefix, self.page_size)
            .try_filter(|object| {
                futures::future::ready(self.filter.admit(watermark, object) == Admission::Accept)
            })
            .try_collect()
            .await
    }

    /// Download, decode and persist one object
    ///
    /// Returns `true` when the object was marked processed.
    async fn ingest_object(&self, object: &SourceObject, stats: &mut RunStats) -> bool {
        let data = match self
            .retry
            .run("download", || self.store.download(&object.key))
            .await
        {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %object.key, error = %e, "Download failed, skipping object");
                stats.objects_failed += 1;
                return false;
            },
        };

        let decoded = match self.decoder.decode(object, &data) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(key = %object.key, error = %e, "Decode failed, skipping object");
                stats.objects_failed += 1;
                return false;
            },
        };

        stats.rows_accepted += decoded.records.len() as u64;
        stats.rows_rejected += decoded.rejected as u64;
        stats.rows_malformed += decoded.malformed as u64;

        for (index, record) in decoded.records.iter().enumerate() {
            match self.retry.run("upsert", || self.sink.upsert(record)).await {
                Ok(()) => stats.rows_upserted += 1,
                Err(e) => {
                    warn!(key = %object.key, row = index + 1, error = %e, "Upsert failed, skipping row");
                    stats.rows_failed += 1;
                },
            }
        }

        stats.objects_processed += 1;

        match self
            .retry
            .run("mark_processed", || self.sink.mark_processed(&object.key))
            .await
        {
            Ok(()) => {
                info!(
                    key = %object.key,
                    accepted = decoded.records.len(),
                    rejected = decoded.rejected,
                    malformed = decoded.malformed,
                    "Object ingested"
                );
                true
            },
            Err(e) => {
                error!(key = %object.key, error = %e, "Failed to mark object processed");
                stats.watermark_failures += 1;
                false
            },
        }
    }
}
