//! Run job definitions
//!
//! A [`FeedRunJob`] is what an HTTP trigger puts on the run queue; a
//! [`RunRecord`] is what the registry reports back about it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::framework::{FeedKind, RunStats};

/// Request to run one feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedRunJob {
    pub run_id: Uuid,
    pub feed: FeedKind,
    pub queued_at: DateTime<Utc>,
}

impl FeedRunJob {
    pub fn new(feed: FeedKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            feed,
            queued_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Observable state of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub feed: FeedKind,
    pub status: RunStatus,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stats: Option<RunStats>,
    pub error: Option<String>,
}

impl RunRecord {
    pub fn queued(job: &FeedRunJob) -> Self {
        Self {
            run_id: job.run_id,
            feed: job.feed,
            status: RunStatus::Queued,
            queued_at: job.queued_at,
            started_at: None,
            finished_at: None,
            stats: None,
            error: None,
        }
    }
}
