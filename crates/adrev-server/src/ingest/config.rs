//! Ingestion configuration
//!
//! Feed sources, markers and secret names, read from `INGEST_*`,
//! `PLACEEXCHANGE_*`, `VSTAR_*` and `SPRINGSERVE_*` environment variables.
//! Secrets themselves are never read here, only their names.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::framework::RetryPolicy;
use super::placeexchange::filename::DEFAULT_FILENAME_PREFIX;
use super::placeexchange::parser::DEFAULT_ORGANIZATION;
use super::springserve::client::DEFAULT_BASE_URL;
use super::springserve::models::{DEFAULT_SCREEN_DIMENSION, DEFAULT_VENUE_DIMENSION};
use super::springserve::pipeline::DEFAULT_LOOKBACK_DAYS;
use super::vstar::parser::DEFAULT_NETWORK;

/// Default listing page size.
pub const DEFAULT_PAGE_SIZE: i32 = super::framework::DEFAULT_PAGE_SIZE;

/// Largest page both S3 and Blob listings accept.
pub const MAX_PAGE_SIZE: i32 = 1000;

/// Default retry count for downloads and procedure calls.
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Default S3 region for the PlaceExchange bucket.
pub const DEFAULT_PLACEEXCHANGE_REGION: &str = "us-east-1";

/// Main ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Objects per listing page
    pub page_size: i32,
    /// Retries for transport failures on download, upsert and watermark writes
    pub max_retries: u32,
    pub placeexchange: PlaceExchangeConfig,
    pub vstar: VStarConfig,
    pub springserve: SpringServeConfig,
}

/// PlaceExchange S3 drop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceExchangeConfig {
    pub bucket: String,
    pub prefix: String,
    pub region: String,
    /// Custom endpoint (MinIO, LocalStack); path-style addressing when set
    pub endpoint: Option<String>,
    /// Rows whose organization differs are dropped
    pub organization: String,
    pub filename_prefix: String,
    pub access_key_secret: String,
    pub secret_key_secret: String,
}

/// VStar Blob container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VStarConfig {
    /// e.g. `https://account.blob.core.windows.net`
    pub account_url: String,
    pub container: String,
    pub prefix: String,
    /// Rows whose network differs are dropped
    pub network: String,
    pub sas_secret: String,
}

/// SpringServe reporting API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringServeConfig {
    pub base_url: String,
    pub email_secret: String,
    pub password_secret: String,
    /// Days to pull when nothing has been stored yet
    pub lookback_days: u64,
    pub venue_dimension: String,
    pub screen_dimension: String,
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl IngestConfig {
    /// Load ingestion configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            page_size: env_parse("INGEST_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            max_retries: env_parse("INGEST_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            placeexchange: PlaceExchangeConfig::from_env(),
            vstar: VStarConfig::from_env(),
            springserve: SpringServeConfig::from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Source locations (bucket, container) may be empty here; a feed with
    /// no source configured fails when it is run.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.page_size <= 0 || self.page_size > MAX_PAGE_SIZE {
            anyhow::bail!(
                "INGEST_PAGE_SIZE must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.page_size
            );
        }
        if self.placeexchange.organization.trim().is_empty() {
            anyhow::bail!("PLACEEXCHANGE_ORGANIZATION cannot be empty");
        }
        if self.placeexchange.filename_prefix.is_empty() {
            anyhow::bail!("PLACEEXCHANGE_FILENAME_PREFIX cannot be empty");
        }
        if self.vstar.network.trim().is_empty() {
            anyhow::bail!("VSTAR_NETWORK cannot be empty");
        }
        if self.springserve.venue_dimension.trim().is_empty()
            || self.springserve.screen_dimension.trim().is_empty()
        {
            anyhow::bail!("SpringServe custom dimension names cannot be empty");
        }
        if self.springserve.lookback_days > 366 {
            anyhow::bail!(
                "SPRINGSERVE_LOOKBACK_DAYS must be at most 366, got {}",
                self.springserve.lookback_days
            );
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_retries(self.max_retries)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            placeexchange: PlaceExchangeConfig::default(),
            vstar: VStarConfig::default(),
            springserve: SpringServeConfig::default(),
        }
    }
}

impl PlaceExchangeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bucket: env_string("PLACEEXCHANGE_BUCKET", &defaults.bucket),
            prefix: env_string("PLACEEXCHANGE_PREFIX", &defaults.prefix),
            region: env_string("PLACEEXCHANGE_REGION", &defaults.region),
            endpoint: std::env::var("PLACEEXCHANGE_ENDPOINT").ok().filter(|s| !s.is_empty()),
            organization: env_string("PLACEEXCHANGE_ORGANIZATION", &defaults.organization),
            filename_prefix: env_string("PLACEEXCHANGE_FILENAME_PREFIX", &defaults.filename_prefix),
            access_key_secret: env_string(
                "PLACEEXCHANGE_ACCESS_KEY_SECRET",
                &defaults.access_key_secret,
            ),
            secret_key_secret: env_string(
                "PLACEEXCHANGE_SECRET_KEY_SECRET",
                &defaults.secret_key_secret,
            ),
        }
    }
}

impl Default for PlaceExchangeConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            prefix: String::new(),
            region: DEFAULT_PLACEEXCHANGE_REGION.to_string(),
            endpoint: None,
            organization: DEFAULT_ORGANIZATION.to_string(),
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            access_key_secret: "placeexchange-access-key".to_string(),
            secret_key_secret: "placeexchange-secret-key".to_string(),
        }
    }
}

impl VStarConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            account_url: env_string("VSTAR_ACCOUNT_URL", &defaults.account_url),
            container: env_string("VSTAR_CONTAINER", &defaults.container),
            prefix: env_string("VSTAR_PREFIX", &defaults.prefix),
            network: env_string("VSTAR_NETWORK", &defaults.network),
            sas_secret: env_string("VSTAR_SAS_SECRET", &defaults.sas_secret),
        }
    }
}

impl Default for VStarConfig {
    fn default() -> Self {
        Self {
            account_url: String::new(),
            container: String::new(),
            prefix: String::new(),
            network: DEFAULT_NETWORK.to_string(),
            sas_secret: "vstar-sas-token".to_string(),
        }
    }
}

impl SpringServeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_string("SPRINGSERVE_BASE_URL", &defaults.base_url),
            email_secret: env_string("SPRINGSERVE_EMAIL_SECRET", &defaults.email_secret),
            password_secret: env_string("SPRINGSERVE_PASSWORD_SECRET", &defaults.password_secret),
            lookback_days: env_parse("SPRINGSERVE_LOOKBACK_DAYS", defaults.lookback_days),
            venue_dimension: env_string("SPRINGSERVE_VENUE_DIMENSION", &defaults.venue_dimension),
            screen_dimension: env_string("SPRINGSERVE_SCREEN_DIMENSION", &defaults.screen_dimension),
        }
    }
}

impl Default for SpringServeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            email_secret: "springserve-email".to_string(),
            password_secret: "springserve-password".to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            venue_dimension: DEFAULT_VENUE_DIMENSION.to_string(),
            screen_dimension: DEFAULT_SCREEN_DIMENSION.to_string(),
        }
    }
}
