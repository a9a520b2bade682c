//! Core types shared by every feed pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One external data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    PlaceExchange,
    VStar,
    SpringServe,
}

impl FeedKind {
    pub const ALL: [FeedKind; 3] = [FeedKind::PlaceExchange, FeedKind::VStar, FeedKind::SpringServe];

    /// Path segment used by the HTTP trigger and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::PlaceExchange => "placeexchange",
            FeedKind::VStar => "vstar",
            FeedKind::SpringServe => "springserve",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FeedKind::PlaceExchange => "PlaceExchange",
            FeedKind::VStar => "VStar",
            FeedKind::SpringServe => "SpringServe",
        }
    }
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for FeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "placeexchange" | "place-exchange" | "pe" => Ok(FeedKind::PlaceExchange),
            "vstar" => Ok(FeedKind::VStar),
            "springserve" => Ok(FeedKind::SpringServe),
            other => Err(format!("Unknown feed: {}", other)),
        }
    }
}

/// Filenames already ingested for a feed
///
/// Loaded once at run start, extended as files are marked processed, and
/// handed back to the caller when the run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermark {
    filenames: HashSet<String>,
}

impl Watermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.filenames.contains(filename)
    }

    pub fn insert(&mut self, filename: impl Into<String>) -> bool {
        self.filenames.insert(filename.into())
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Watermark {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            filenames: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Counters collected during one feed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub feed: FeedKind,
    pub objects_listed: u64,
    /// Already in the watermark or filtered by extension
    pub objects_skipped: u64,
    pub objects_processed: u64,
    /// Download or decode failed; the object stays unmarked
    pub objects_failed: u64,
    pub rows_accepted: u64,
    /// Failed the feed's acceptance rule
    pub rows_rejected: u64,
    /// Too few columns to map
    pub rows_malformed: u64,
    pub rows_upserted: u64,
    pub rows_failed: u64,
    pub watermark_failures: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
}

impl RunStats {
    pub fn new(feed: FeedKind) -> Self {
        Self {
            feed,
            objects_listed: 0,
            objects_skipped: 0,
            objects_processed: 0,
            objects_failed: 0,
            rows_accepted: 0,
            rows_rejected: 0,
            rows_malformed: 0,
            rows_upserted: 0,
            rows_failed: 0,
            watermark_failures: 0,
            started_at: Utc::now(),
            completed_at: None,
            duration_secs: 0.0,
        }
    }

    pub fn complete(&mut self) {
        let end = Utc::now();
        self.completed_at = Some(end);
        self.duration_secs = (end - self.started_at).num_milliseconds() as f64 / 1000.0;
    }
}

/// Result of a file-based feed run: counters plus the extended watermark
#[derive(Debug, Clone)]
pub struct FeedRunOutcome {
    pub stats: RunStats,
    pub watermark: Watermark,
}
