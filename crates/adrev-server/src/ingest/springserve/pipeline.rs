//! SpringServe run
//!
//! There are no files to list: the run asks the reporting API for every day
//! from the last stored day through yesterday and upserts each row.

use adrev_common::Result;
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::ProcedureExecutor;
use crate::ingest::config::SpringServeConfig;
use crate::ingest::framework::{FeedKind, RetryPolicy, RunStats};

use super::client::{ReportRequest, ReportSource};
use super::models::{CustomDimensions, SpringServeRecord};
use super::storage::SpringServeSink;

pub const DEFAULT_LOOKBACK_DAYS: u64 = 7;

/// Inclusive report range for a run on `today`, or `None` if nothing is due
///
/// Starts at the last stored day, which is pulled again since it may have
/// been partial, or `lookback_days` before today when nothing is stored.
/// Ends at yesterday.
pub fn report_window(
    last_day: Option<NaiveDate>,
    today: NaiveDate,
    lookback_days: u64,
) -> Option<(NaiveDate, NaiveDate)> {
    let end = today.checked_sub_days(Days::new(1))?;
    let start = match last_day {
        Some(day) => day,
        None => today.checked_sub_days(Days::new(lookback_days))?,
    };

    (start <= end).then_some((start, end))
}

pub struct SpringServePipeline {
    source: Arc<dyn ReportSource>,
    sink: SpringServeSink,
    dimensions: CustomDimensions,
    lookback_days: u64,
    retry: RetryPolicy,
}

impl SpringServePipeline {
    pub fn new(source: Arc<dyn ReportSource>, executor: Arc<dyn ProcedureExecutor>) -> Self {
        Self {
            source,
            sink: SpringServeSink::new(executor),
            dimensions: CustomDimensions::default(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_dimensions(mut self, dimensions: CustomDimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_lookback_days(mut self, days: u64) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Report range a run on `today` would request
    pub async fn pending_window(&self, today: NaiveDate) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let last_day = self.sink.last_day().await?;
        Ok(report_window(last_day, today, self.lookback_days))
    }

    /// Fetch and store every report day due as of `today`
    pub async fn run(&self, today: NaiveDate) -> Result<RunStats> {
        let mut stats = RunStats::new(FeedKind::SpringServe);

        let last_day = self.sink.last_day().await.inspect_err(|e| {
            error!(error = %e, "Failed to read last SpringServe report day");
        })?;

        let Some((start, end)) = report_window(last_day, today, self.lookback_days) else {
            info!(?last_day, %today, "SpringServe is up to date");
            stats.complete();
            return Ok(stats);
        };

        info!(%start, %end, "Requesting SpringServe report");
        let request = ReportRequest::daily(start, end, self.dimensions.report_dimensions());
        let rows = self.source.fetch_report(&request).await.inspect_err(|e| {
            error!(error = %e, "SpringServe report request failed");
        })?;

        for (index, row) in rows.iter().enumerate() {
            let Some(record) = SpringServeRecord::from_row(row, &self.dimensions) else {
                stats.rows_rejected += 1;
                continue;
            };
            stats.rows_accepted += 1;

            match self.retry.run("upsert", || self.sink.upsert(&record)).await {
                Ok(()) => stats.rows_upserted += 1,
                Err(e) => {
                    warn!(row = index + 1, error = %e, "Upsert failed, skipping row");
                    stats.rows_failed += 1;
                },
            }
        }

        stats.complete();
        info!(
            rows = rows.len(),
            accepted = stats.rows_accepted,
            dropped = stats.rows_rejected,
            upserted = stats.rows_upserted,
            failed = stats.rows_failed,
            "SpringServe run complete"
        );

        Ok(stats)
    }
}

/// Build the SpringServe run from configuration
pub fn build_pipeline(
    config: &SpringServeConfig,
    source: Arc<dyn ReportSource>,
    executor: Arc<dyn ProcedureExecutor>,
    retry: RetryPolicy,
) -> SpringServePipeline {
    SpringServePipeline::new(source, executor)
        .with_dimensions(CustomDimensions {
            venue: config.venue_dimension.clone(),
            screen: config.screen_dimension.clone(),
        })
        .with_lookback_days(config.lookback_days)
        .with_retry(retry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RecordingExecutor;
    use crate::ingest::springserve::client::ReportRow;
    use crate::ingest::springserve::storage::LAST_DAY_PROCEDURE;
    use adrev_common::AdrevError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Canned report rows; records every request
    #[derive(Default)]
    struct StubReport {
        rows: Vec<ReportRow>,
        fail: bool,
        requests: Mutex<Vec<ReportRequest>>,
    }

    #[async_trait]
    impl ReportSource for StubReport {
        async fn fetch_report(&self, request: &ReportRequest) -> Result<Vec<ReportRow>> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(AdrevError::transport("401 Unauthorized"));
            }
            Ok(self.rows.clone())
        }
    }

    fn row(venue: serde_json::Value, screen: serde_json::Value) -> ReportRow {
        let value = json!({
            "date": "2024-03-14",
            "supply_tag_id": 1,
            "supply_tag_name": "Lobby",
            "demand_tag_id": 2,
            "demand_tag_name": "Demand",
            "venue_id": venue,
            "screen_id": screen,
            "impressions": 2000,
            "revenue": 10.0,
        });
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_window_from_last_day() {
        let today = day(2024, 3, 15);
        assert_eq!(
            report_window(Some(day(2024, 3, 12)), today, 7),
            Some((day(2024, 3, 12), day(2024, 3, 14)))
        );
    }

    #[test]
    fn test_window_uses_lookback_when_empty() {
        let today = day(2024, 3, 15);
        assert_eq!(report_window(None, today, 7), Some((day(2024, 3, 8), day(2024, 3, 14))));
    }

    #[test]
    fn test_window_empty_when_caught_up() {
        let today = day(2024, 3, 15);
        assert_eq!(report_window(Some(day(2024, 3, 15)), today, 7), None);
        assert_eq!(report_window(None, today, 0), None);
        // Yesterday is re-pulled
        assert!(report_window(Some(day(2024, 3, 14)), today, 7).is_some());
    }

    #[tokio::test]
    async fn test_run_drops_rows_without_dimensions() {
        let source = Arc::new(StubReport {
            rows: vec![
                row(json!("V-1"), json!("S-1")),
                row(json!("V-2"), json!(null)),
                row(json!(""), json!("S-3")),
                row(json!("V-4"), json!(4)),
            ],
            ..Default::default()
        });
        let executor =
            Arc::new(RecordingExecutor::new().with_date(LAST_DAY_PROCEDURE, day(2024, 3, 13)));
        let pipeline = SpringServePipeline::new(source.clone(), executor.clone());

        let stats = pipeline.run(day(2024, 3, 15)).await.unwrap();

        assert_eq!(stats.rows_accepted, 2);
        assert_eq!(stats.rows_rejected, 2);
        assert_eq!(stats.rows_upserted, 2);
        assert_eq!(executor.count("SpringserveReportDays_set"), 2);

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].start_date, day(2024, 3, 13));
        assert_eq!(requests[0].end_date, day(2024, 3, 14));
        assert_eq!(requests[0].interval, "day");
    }

    #[tokio::test]
    async fn test_up_to_date_run_makes_no_calls() {
        let source = Arc::new(StubReport::default());
        let executor = Arc::new(
            RecordingExecutor::new().with_date("SpringserveReportDays_LastDay", day(2024, 3, 15)),
        );

        let stats = SpringServePipeline::new(source.clone(), executor.clone())
            .run(day(2024, 3, 15))
            .await
            .unwrap();

        assert_eq!(stats.rows_accepted, 0);
        assert!(source.requests.lock().unwrap().is_empty());
        assert_eq!(executor.count("SpringserveReportDays_set"), 0);
    }

    #[tokio::test]
    async fn test_pending_window_reads_last_day() {
        let executor = Arc::new(
            RecordingExecutor::new().with_date(LAST_DAY_PROCEDURE, day(2024, 3, 10)),
        );
        let pipeline = SpringServePipeline::new(Arc::new(StubReport::default()), executor);

        let window = pipeline.pending_window(day(2024, 3, 15)).await.unwrap();
        assert_eq!(window, Some((day(2024, 3, 10), day(2024, 3, 14))));
    }

    #[tokio::test]
    async fn test_report_failure_fails_run() {
        let source = Arc::new(StubReport {
            fail: true,
            ..Default::default()
        });
        let executor = Arc::new(RecordingExecutor::new());

        let result = SpringServePipeline::new(source, executor.clone())
            .run(day(2024, 3, 15))
            .await;

        assert!(result.is_err());
        assert_eq!(executor.count("SpringserveReportDays_set"), 0);
    }

    #[tokio::test]
    async fn test_bad_row_value_is_skipped() {
        let mut bad = row(json!("V-1"), json!("S-1"));
        bad.insert("revenue".into(), json!("n/a"));
        let source = Arc::new(StubReport {
            rows: vec![bad, row(json!("V-2"), json!("S-2"))],
            ..Default::default()
        });
        let executor = Arc::new(RecordingExecutor::new());

        let stats = SpringServePipeline::new(source, executor.clone())
            .run(day(2024, 3, 15))
            .await
            .unwrap();

        assert_eq!(stats.rows_failed, 1);
        assert_eq!(stats.rows_upserted, 1);
        assert_eq!(executor.count("SpringserveReportDays_set"), 1);
    }
}
