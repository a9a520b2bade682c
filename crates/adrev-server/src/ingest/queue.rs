//! Run queue and worker
//!
//! HTTP triggers enqueue a [`FeedRunJob`] and return at once. A single worker
//! task drains the queue strictly in order, so two runs never overlap. Run
//! state is kept in memory by the [`RunRegistry`].

use adrev_common::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, Instrument};
use uuid::Uuid;

use super::framework::{FeedKind, RunStats};
use super::jobs::{FeedRunJob, RunRecord, RunStatus};

/// Default number of runs that may wait in the queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Finished runs kept for status queries.
pub const MAX_FINISHED_RUNS: usize = 500;

/// Runs one feed to completion
#[async_trait]
pub trait FeedExecutor: Send + Sync {
    async fn run_feed(&self, feed: FeedKind) -> Result<RunStats>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("run queue is full")]
    Full,

    #[error("run queue is closed")]
    Closed,
}

/// In-memory run history
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: RwLock<HashMap<Uuid, RunRecord>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, run_id: Uuid, apply: impl FnOnce(&mut RunRecord)) {
        let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = runs.get_mut(&run_id) {
            apply(record);
        }
    }

    pub fn insert_queued(&self, job: &FeedRunJob) {
        let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
        runs.insert(job.run_id, RunRecord::queued(job));
        prune(&mut runs);
    }

    pub fn remove(&self, run_id: Uuid) {
        let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
        runs.remove(&run_id);
    }

    pub fn mark_running(&self, run_id: Uuid) {
        self.update(run_id, |record| {
            record.status = RunStatus::Running;
            record.started_at = Some(Utc::now());
        });
    }

    pub fn mark_completed(&self, run_id: Uuid, stats: RunStats) {
        self.update(run_id, |record| {
            record.status = RunStatus::Completed;
            record.finished_at = Some(Utc::now());
            record.stats = Some(stats);
        });
    }

    pub fn mark_failed(&self, run_id: Uuid, error: impl Into<String>) {
        let error = error.into();
        self.update(run_id, |record| {
            record.status = RunStatus::Failed;
            record.finished_at = Some(Utc::now());
            record.error = Some(error);
        });
    }

    pub fn get(&self, run_id: Uuid) -> Option<RunRecord> {
        let runs = self.runs.read().unwrap_or_else(|e| e.into_inner());
        runs.get(&run_id).cloned()
    }

    /// Every known run, most recently queued first
    pub fn list(&self) -> Vec<RunRecord> {
        let runs = self.runs.read().unwrap_or_else(|e| e.into_inner());
        let mut records: Vec<RunRecord> = runs.values().cloned().collect();
        records.sort_by(|a, b| b.queued_at.cmp(&a.queued_at));
        records
    }
}

/// Drop the oldest finished runs beyond [`MAX_FINISHED_RUNS`]
fn prune(runs: &mut HashMap<Uuid, RunRecord>) {
    let mut finished: Vec<(chrono::DateTime<Utc>, Uuid)> = runs
        .values()
        .filter(|r| r.status.is_finished())
        .map(|r| (r.queued_at, r.run_id))
        .collect();

    if finished.len() <= MAX_FINISHED_RUNS {
        return;
    }

    finished.sort();
    let excess = finished.len() - MAX_FINISHED_RUNS;
    for (_, run_id) in finished.into_iter().take(excess) {
        runs.remove(&run_id);
    }
}

/// Producer side of the run queue
#[derive(Clone)]
pub struct RunQueue {
    sender: mpsc::Sender<FeedRunJob>,
    registry: Arc<RunRegistry>,
}

/// Consumer side; started once with [`RunWorker::start`]
pub struct RunWorker {
    receiver: mpsc::Receiver<FeedRunJob>,
    registry: Arc<RunRegistry>,
}

impl RunQueue {
    pub fn new(capacity: usize) -> (Self, RunWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let registry = Arc::new(RunRegistry::new());
        (
            Self {
                sender,
                registry: registry.clone(),
            },
            RunWorker { receiver, registry },
        )
    }

    /// Queue a run of `feed` and return its id without waiting for it
    pub fn enqueue(&self, feed: FeedKind) -> std::result::Result<Uuid, EnqueueError> {
        let job = FeedRunJob::new(feed);
        let run_id = job.run_id;
        self.registry.insert_queued(&job);

        match self.sender.try_send(job) {
            Ok(()) => {
                info!(%run_id, feed = %feed, "Run queued");
                Ok(run_id)
            },
            Err(e) => {
                self.registry.remove(run_id);
                Err(match e {
                    mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
                    mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
                })
            },
        }
    }

    pub fn registry(&self) -> Arc<RunRegistry> {
        self.registry.clone()
    }
}

impl RunWorker {
    /// Spawn the worker; it stops once every [`RunQueue`] handle is dropped
    pub fn start(self, executor: Arc<dyn FeedExecutor>) -> JoinHandle<()> {
        let RunWorker {
            mut receiver,
            registry,
        } = self;

        tokio::spawn(async move {
            info!("Run worker started");

            while let Some(job) = receiver.recv().await {
                let span = tracing::info_span!("feed_run", run_id = %job.run_id, feed = %job.feed);
                registry.mark_running(job.run_id);

                // Own task per run so a panic fails the run instead of the worker
                let run = {
                    let executor = executor.clone();
                    let feed = job.feed;
                    tokio::spawn(async move { executor.run_feed(feed).await }.instrument(span))
                };

                match run.await {
                    Ok(Ok(stats)) => registry.mark_completed(job.run_id, stats),
                    Ok(Err(e)) => {
                        error!(run_id = %job.run_id, feed = %job.feed, error = %e, "Feed run failed");
                        registry.mark_failed(job.run_id, e.to_string());
                    },
                    Err(e) => {
                        let reason = join_failure(e);
                        error!(run_id = %job.run_id, feed = %job.feed, error = %reason, "Feed run aborted");
                        registry.mark_failed(job.run_id, reason);
                    },
                }
            }

            info!("Run worker stopped");
        })
    }
}

fn join_failure(e: JoinError) -> String {
    if !e.is_panic() {
        return format!("feed run cancelled: {}", e);
    }

    let payload = e.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|m| m.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("feed run panicked: {}", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adrev_common::AdrevError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fails VStar, succeeds otherwise; tracks overlapping runs
    #[derive(Default)]
    struct StubExecutor {
        active: AtomicUsize,
        max_active: AtomicUsize,
        runs: AtomicUsize,
    }

    #[async_trait]
    impl FeedExecutor for StubExecutor {
        async fn run_feed(&self, feed: FeedKind) -> Result<RunStats> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.runs.fetch_add(1, Ordering::SeqCst);

            match feed {
                FeedKind::VStar => Err(AdrevError::transport("listing failed")),
                other => Ok(RunStats::new(other)),
            }
        }
    }

    async fn wait_until_finished(registry: &RunRegistry, run_id: Uuid) -> RunRecord {
        for _ in 0..200 {
            if let Some(record) = registry.get(run_id) {
                if record.status.is_finished() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("run {} did not finish", run_id);
    }

    #[tokio::test]
    async fn test_runs_complete_or_fail() {
        let (queue, worker) = RunQueue::new(8);
        let executor = Arc::new(StubExecutor::default());
        let handle = worker.start(executor.clone());
        let registry = queue.registry();

        let ok = queue.enqueue(FeedKind::PlaceExchange).unwrap();
        let failing = queue.enqueue(FeedKind::VStar).unwrap();

        let ok = wait_until_finished(&registry, ok).await;
        assert_eq!(ok.status, RunStatus::Completed);
        assert!(ok.started_at.is_some());
        assert_eq!(ok.stats.unwrap().feed, FeedKind::PlaceExchange);

        let failing = wait_until_finished(&registry, failing).await;
        assert_eq!(failing.status, RunStatus::Failed);
        assert!(failing.error.unwrap().contains("listing failed"));

        drop(queue);
        handle.await.unwrap();
    }

    /// Panics on SpringServe, succeeds otherwise
    struct PanickingExecutor;

    #[async_trait]
    impl FeedExecutor for PanickingExecutor {
        async fn run_feed(&self, feed: FeedKind) -> Result<RunStats> {
            if feed == FeedKind::SpringServe {
                panic!("report row out of bounds");
            }
            Ok(RunStats::new(feed))
        }
    }

    #[tokio::test]
    async fn test_panicking_run_fails_and_worker_continues() {
        let (queue, worker) = RunQueue::new(8);
        let handle = worker.start(Arc::new(PanickingExecutor));
        let registry = queue.registry();

        let panicked = queue.enqueue(FeedKind::SpringServe).unwrap();
        let next = queue.enqueue(FeedKind::PlaceExchange).unwrap();

        let panicked = wait_until_finished(&registry, panicked).await;
        assert_eq!(panicked.status, RunStatus::Failed);
        assert!(panicked.finished_at.is_some());
        let error = panicked.error.unwrap();
        assert!(error.contains("panicked"));
        assert!(error.contains("report row out of bounds"));

        let next = wait_until_finished(&registry, next).await;
        assert_eq!(next.status, RunStatus::Completed);

        // Worker survived and still accepts runs
        let later = queue.enqueue(FeedKind::VStar).unwrap();
        assert_eq!(wait_until_finished(&registry, later).await.status, RunStatus::Completed);

        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_runs_never_overlap() {
        let (queue, worker) = RunQueue::new(8);
        let executor = Arc::new(StubExecutor::default());
        let handle = worker.start(executor.clone());

        for _ in 0..4 {
            queue.enqueue(FeedKind::PlaceExchange).unwrap();
        }
        drop(queue);
        handle.await.unwrap();

        assert_eq!(executor.runs.load(Ordering::SeqCst), 4);
        assert_eq!(executor.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_full_queue_rejects() {
        let (queue, _worker) = RunQueue::new(1);

        queue.enqueue(FeedKind::SpringServe).unwrap();
        assert_eq!(queue.enqueue(FeedKind::SpringServe), Err(EnqueueError::Full));
        assert_eq!(queue.registry().list().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_queue_rejects() {
        let (queue, worker) = RunQueue::new(1);
        drop(worker);
        assert_eq!(queue.enqueue(FeedKind::VStar), Err(EnqueueError::Closed));
        assert!(queue.registry().list().is_empty());
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let registry = RunRegistry::new();
        let mut first = FeedRunJob::new(FeedKind::VStar);
        first.queued_at = Utc::now() - chrono::Duration::minutes(5);
        let second = FeedRunJob::new(FeedKind::PlaceExchange);

        registry.insert_queued(&first);
        registry.insert_queued(&second);

        let runs = registry.list();
        assert_eq!(runs[0].run_id, second.run_id);
        assert_eq!(runs[1].run_id, first.run_id);
    }
}
