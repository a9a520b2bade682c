//! In-memory object store
//!
//! Stands in for S3 and Blob in the unit and integration tests. Listing order
//! is key order; continuation tokens are offsets.

use adrev_common::{AdrevError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use super::{ListPage, ObjectStore, SourceObject};

#[derive(Default)]
pub struct MemoryStore {
    container: String,
    objects: BTreeMap<String, Vec<u8>>,
    failing_downloads: HashSet<String>,
    fail_listing_after: Option<usize>,
    list_calls: Mutex<usize>,
    downloads: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..Default::default()
        }
    }

    pub fn with_object(mut self, key: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(key.into(), data.into());
        self
    }

    /// List the key but fail every download of it with a transport error
    pub fn with_failing_object(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.objects.insert(key.clone(), Vec::new());
        self.failing_downloads.insert(key);
        self
    }

    /// Fail every listing request after the first `pages` succeed
    pub fn fail_listing_after(mut self, pages: usize) -> Self {
        self.fail_listing_after = Some(pages);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.lock().map(|n| *n).unwrap_or_default()
    }

    /// Keys downloaded so far, in request order
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn list_page(
        &self,
        prefix: &str,
        max_keys: i32,
        continuation: Option<String>,
    ) -> Result<ListPage> {
        let calls = {
            let mut calls = self
                .list_calls
                .lock()
                .map_err(|_| AdrevError::transport("listing counter poisoned"))?;
            *calls += 1;
            *calls
        };

        if let Some(limit) = self.fail_listing_after {
            if calls > limit {
                return Err(AdrevError::transport(format!(
                    "listing {} failed on page {}",
                    self.container, calls
                )));
            }
        }

        let offset: usize = match continuation {
            Some(token) => token
                .parse()
                .map_err(|_| AdrevError::transport(format!("bad continuation token {}", token)))?,
            None => 0,
        };
        let page_size = usize::try_from(max_keys.max(1)).unwrap_or(1);

        let matching: Vec<&String> = self.objects.keys().filter(|k| k.starts_with(prefix)).collect();
        let objects = matching
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|key| SourceObject {
                container: self.container.clone(),
                key: (*key).clone(),
                last_modified: None,
                size: self.objects.get(*key).and_then(|d| i64::try_from(d.len()).ok()),
            })
            .collect();

        let next = offset + page_size;
        let continuation = (next < matching.len()).then(|| next.to_string());

        Ok(ListPage {
            objects,
            continuation,
        })
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        if let Ok(mut downloads) = self.downloads.lock() {
            downloads.push(key.to_string());
        }

        if self.failing_downloads.contains(key) {
            return Err(AdrevError::transport(format!("connection reset while downloading {}", key)));
        }

        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| AdrevError::transport(format!("object not found: {}", key)))
    }
}
