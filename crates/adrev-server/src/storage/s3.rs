//! S3 object store

use adrev_common::{AdrevError, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::DateTime as S3DateTime,
    Client,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use super::{config::S3StoreConfig, ListPage, ObjectStore, SourceObject};

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(config: S3StoreConfig) -> Self {
        debug!("Initializing S3 store with config: {:?}", config);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "adrev-feeds",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());

        info!(bucket = %config.bucket, "S3 store initialized");

        Self {
            client,
            bucket: config.bucket,
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn container(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self))]
    async fn list_page(
        &self,
        prefix: &str,
        max_keys: i32,
        continuation: Option<String>,
    ) -> Result<ListPage> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(max_keys);

        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let response = request.send().await.map_err(|e| {
            AdrevError::transport(format!(
                "Failed to list s3://{}/{}: {}",
                self.bucket,
                prefix,
                DisplayErrorContext(&e)
            ))
        })?;

        let objects: Vec<SourceObject> = response
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?;
                Some(SourceObject {
                    container: self.bucket.clone(),
                    key: key.to_string(),
                    last_modified: obj.last_modified().and_then(to_chrono),
                    size: obj.size(),
                })
            })
            .collect();

        let continuation = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        debug!(
            "Listed {} objects in s3://{}/{} (more: {})",
            objects.len(),
            self.bucket,
            prefix,
            continuation.is_some()
        );

        Ok(ListPage {
            objects,
            continuation,
        })
    }

    #[instrument(skip(self))]
    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AdrevError::transport(format!(
                    "Failed to download s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| AdrevError::transport(format!("Failed to read S3 response body: {}", e)))?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), self.bucket, key);

        Ok(data)
    }
}

fn to_chrono(dt: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}
