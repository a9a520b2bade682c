//! Object storage access for feed sources
//!
//! Feeds are read from two kinds of remote store:
//!
//! - **S3** ([`s3::S3Store`]): PlaceExchange report drops
//! - **Azure Blob** ([`blob::BlobStore`]): the VStar container
//!
//! Both implement [`ObjectStore`], which exposes exactly what ingestion needs:
//! one page of a prefix listing and a whole-object download.

use adrev_common::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod blob;
pub mod config;
pub mod memory;
pub mod s3;

pub use blob::BlobStore;
pub use config::{BlobStoreConfig, S3StoreConfig};
pub use memory::MemoryStore;
pub use s3::S3Store;

/// Identity of one remote object, as reported by a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceObject {
    /// Bucket or container name
    pub container: String,
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: Option<i64>,
}

impl SourceObject {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
            last_modified: None,
            size: None,
        }
    }

    /// Last path segment of the key
    pub fn filename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Lowercased extension of the filename, without the dot
    pub fn extension(&self) -> Option<String> {
        let filename = self.filename();
        let (stem, ext) = filename.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<SourceObject>,
    /// Token for the next page; `None` once the listing is exhausted
    pub continuation: Option<String>,
}

/// Remote object store holding feed files
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket or container this store reads from
    fn container(&self) -> &str;

    /// Fetch one listing page under `prefix`
    async fn list_page(
        &self,
        prefix: &str,
        max_keys: i32,
        continuation: Option<String>,
    ) -> Result<ListPage>;

    /// Download a whole object
    async fn download(&self, key: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_and_extension() {
        let object = SourceObject::new("reports", "daily/2024/placeexchange_2024-03-15.CSV");
        assert_eq!(object.filename(), "placeexchange_2024-03-15.CSV");
        assert_eq!(object.extension().as_deref(), Some("csv"));
    }

    #[test]
    fn test_extension_edge_cases() {
        assert_eq!(SourceObject::new("c", "README").extension(), None);
        assert_eq!(SourceObject::new("c", "dir/.hidden").extension(), None);
        assert_eq!(SourceObject::new("c", "report.").extension(), None);
        assert_eq!(SourceObject::new("c", "a.b.xlsx").extension().as_deref(), Some("xlsx"));
    }
}
