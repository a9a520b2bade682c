use serde::{Deserialize, Serialize};

/// Connection settings for an S3 (or S3-compatible) bucket
#[derive(Clone, Serialize, Deserialize)]
pub struct S3StoreConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub path_style: bool,
}

impl S3StoreConfig {
    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            bucket: bucket.into(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
        }
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for S3StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("path_style", &self.path_style)
            .finish_non_exhaustive()
    }
}

/// Connection settings for an Azure Blob container accessed with a SAS token
#[derive(Clone, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    /// e.g. `https://vstarfeeds.blob.core.windows.net`
    pub account_url: String,
    pub container: String,
    /// SAS query string, with or without the leading `?`
    pub sas_token: String,
}

impl BlobStoreConfig {
    pub fn new(
        account_url: impl Into<String>,
        container: impl Into<String>,
        sas_token: impl Into<String>,
    ) -> Self {
        Self {
            account_url: account_url.into().trim_end_matches('/').to_string(),
            container: container.into(),
            sas_token: sas_token.into().trim_start_matches('?').to_string(),
        }
    }
}

impl std::fmt::Debug for BlobStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStoreConfig")
            .field("account_url", &self.account_url)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}
