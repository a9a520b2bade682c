//! Azure Blob object store
//!
//! Talks to the Blob REST API directly with `reqwest`, authenticating every
//! request with a container SAS token. Listing uses `List Blobs`
//! (`restype=container&comp=list`), paging with `marker`/`NextMarker`.

use adrev_common::{AdrevError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{config::BlobStoreConfig, ListPage, ObjectStore, SourceObject};

#[derive(Clone)]
pub struct BlobStore {
    http: reqwest::Client,
    config: BlobStoreConfig,
}

impl BlobStore {
    pub fn new(config: BlobStoreConfig) -> Self {
        info!(container = %config.container, account = %config.account_url, "Blob store initialized");
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn with_client(http: reqwest::Client, config: BlobStoreConfig) -> Self {
        Self { http, config }
    }

    fn container_url(&self) -> String {
        format!(
            "{}/{}?{}",
            self.config.account_url, self.config.container, self.config.sas_token
        )
    }

    fn blob_url(&self, key: &str) -> String {
        let path = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{}/{}?{}",
            self.config.account_url, self.config.container, path, self.config.sas_token
        )
    }
}

#[async_trait]
impl ObjectStore for BlobStore {
    fn container(&self) -> &str {
        &self.config.container
    }

    #[instrument(skip(self))]
    async fn list_page(
        &self,
        prefix: &str,
        max_keys: i32,
        continuation: Option<String>,
    ) -> Result<ListPage> {
        let mut query: Vec<(&str, String)> = vec![
            ("restype", "container".to_string()),
            ("comp", "list".to_string()),
            ("maxresults", max_keys.to_string()),
        ];
        if !prefix.is_empty() {
            query.push(("prefix", prefix.to_string()));
        }
        if let Some(marker) = continuation {
            query.push(("marker", marker));
        }

        let response = self
            .http
            .get(self.container_url())
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                AdrevError::transport(format!(
                    "Failed to list container {}: {}",
                    self.config.container, e
                ))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdrevError::transport(format!("Failed to read listing body: {}", e)))?;

        if !status.is_success() {
            return Err(AdrevError::transport(format!(
                "Listing container {} returned {}: {}",
                self.config.container, status, body
            )));
        }

        let page = parse_listing(&self.config.container, &body)?;
        debug!(
            "Listed {} blobs in {}/{} (more: {})",
            page.objects.len(),
            self.config.container,
            prefix,
            page.continuation.is_some()
        );

        Ok(page)
    }

    #[instrument(skip(self))]
    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.blob_url(key))
            .send()
            .await
            .map_err(|e| AdrevError::transport(format!("Failed to download blob {}: {}", key, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdrevError::transport(format!(
                "Downloading blob {} returned {}",
                key, status
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| AdrevError::transport(format!("Failed to read blob {}: {}", key, e)))?
            .to_vec();

        debug!("Downloaded {} bytes from blob {}/{}", data.len(), self.config.container, key);

        Ok(data)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnumerationResults {
    #[serde(default)]
    blobs: BlobList,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BlobList {
    #[serde(rename = "Blob", default)]
    items: Vec<BlobItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BlobItem {
    name: String,
    #[serde(default)]
    properties: Option<BlobProperties>,
}

#[derive(Debug, Deserialize)]
struct BlobProperties {
    #[serde(rename = "Last-Modified", default)]
    last_modified: Option<String>,
    #[serde(rename = "Content-Length", default)]
    content_length: Option<i64>,
}

/// Decode a `List Blobs` XML response body
fn parse_listing(container: &str, xml: &str) -> Result<ListPage> {
    let results: EnumerationResults = quick_xml::de::from_str(xml)
        .map_err(|e| AdrevError::transport(format!("Malformed blob listing: {}", e)))?;

    let objects = results
        .blobs
        .items
        .into_iter()
        .map(|item| {
            let (last_modified, size) = match item.properties {
                Some(props) => (
                    props
                        .last_modified
                        .as_deref()
                        .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
                        .map(|dt| dt.with_timezone(&Utc)),
                    props.content_length,
                ),
                None => (None, None),
            };
            SourceObject {
                container: container.to_string(),
                key: item.name,
                last_modified,
                size,
            }
        })
        .collect();

    let continuation = results
        .next_marker
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    Ok(ListPage {
        objects,
        continuation,
    })
}
