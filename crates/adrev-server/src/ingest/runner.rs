//! Feed runner
//!
//! Owns the SQL Server executor and one source per feed, and runs a feed on
//! request. Sources whose configuration or secrets are missing are left out;
//! running such a feed fails with a configuration error.

use adrev_common::{AdrevError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{ProcedureExecutor, SqlServerExecutor};
use crate::secrets::SecretStore;
use crate::storage::{BlobStore, BlobStoreConfig, ObjectStore, S3Store, S3StoreConfig, SourceObject};

use super::config::IngestConfig;
use super::framework::{FeedKind, RunStats};
use super::queue::FeedExecutor;
use super::springserve::{ReportSource, SpringServeClient, SpringServeCredentials};
use super::{placeexchange, springserve, vstar};

/// What a run would pick up next
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
    /// Objects the dedup filter admits
    Objects(Vec<SourceObject>),
    /// Inclusive report range; `None` when up to date
    ReportDays(Option<(NaiveDate, NaiveDate)>),
}

pub struct FeedRunner {
    config: IngestConfig,
    executor: Arc<dyn ProcedureExecutor>,
    placeexchange: Option<Arc<dyn ObjectStore>>,
    vstar: Option<Arc<dyn ObjectStore>>,
    springserve: Option<Arc<dyn ReportSource>>,
}

impl FeedRunner {
    /// Runner with no sources; attach them with the `with_*` methods
    pub fn new(config: IngestConfig, executor: Arc<dyn ProcedureExecutor>) -> Self {
        Self {
            config,
            executor,
            placeexchange: None,
            vstar: None,
            springserve: None,
        }
    }

    pub fn with_placeexchange_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.placeexchange = Some(store);
        self
    }

    pub fn with_vstar_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.vstar = Some(store);
        self
    }

    pub fn with_report_source(mut self, source: Arc<dyn ReportSource>) -> Self {
        self.springserve = Some(source);
        self
    }

    /// Resolve secrets, connect to SQL Server, and build every configured source
    pub async fn connect(
        config: IngestConfig,
        database_secret: &str,
        secrets: &dyn SecretStore,
    ) -> Result<Self> {
        let connection_string = secrets.get(database_secret).await?;
        let executor = SqlServerExecutor::connect(&connection_string).await?;
        info!("Connected to SQL Server");

        let mut runner = Self::new(config, Arc::new(executor));

        match runner.placeexchange_store(secrets).await {
            Ok(Some(store)) => runner.placeexchange = Some(store),
            Ok(None) => info!("PLACEEXCHANGE_BUCKET not set, PlaceExchange feed disabled"),
            Err(e) => warn!(error = %e, "PlaceExchange feed disabled"),
        }

        match runner.vstar_store(secrets).await {
            Ok(Some(store)) => runner.vstar = Some(store),
            Ok(None) => info!("VSTAR_ACCOUNT_URL or VSTAR_CONTAINER not set, VStar feed disabled"),
            Err(e) => warn!(error = %e, "VStar feed disabled"),
        }

        match runner.springserve_source(secrets).await {
            Ok(source) => runner.springserve = Some(source),
            Err(e) => warn!(error = %e, "SpringServe feed disabled"),
        }

        Ok(runner)
    }

    async fn placeexchange_store(
        &self,
        secrets: &dyn SecretStore,
    ) -> Result<Option<Arc<dyn ObjectStore>>> {
        let pe = &self.config.placeexchange;
        if pe.bucket.is_empty() {
            return Ok(None);
        }

        let store = S3Store::new(S3StoreConfig {
            endpoint: pe.endpoint.clone(),
            region: pe.region.clone(),
            bucket: pe.bucket.clone(),
            access_key: secrets.get(&pe.access_key_secret).await?,
            secret_key: secrets.get(&pe.secret_key_secret).await?,
            path_style: pe.endpoint.is_some(),
        });
        Ok(Some(Arc::new(store)))
    }

    async fn vstar_store(&self, secrets: &dyn SecretStore) -> Result<Option<Arc<dyn ObjectStore>>> {
        let vs = &self.config.vstar;
        if vs.account_url.is_empty() || vs.container.is_empty() {
            return Ok(None);
        }

        let sas_token = secrets.get(&vs.sas_secret).await?;
        let store = BlobStore::new(BlobStoreConfig::new(&vs.account_url, &vs.container, sas_token));
        Ok(Some(Arc::new(store)))
    }

    async fn springserve_source(&self, secrets: &dyn SecretStore) -> Result<Arc<dyn ReportSource>> {
        let ss = &self.config.springserve;
        let credentials = SpringServeCredentials {
            email: secrets.get(&ss.email_secret).await?,
            password: secrets.get(&ss.password_secret).await?,
        };
        Ok(Arc::new(SpringServeClient::new(&ss.base_url, credentials)))
    }

    /// Feeds that have a source attached
    pub fn available_feeds(&self) -> Vec<FeedKind> {
        FeedKind::ALL
            .into_iter()
            .filter(|feed| match feed {
                FeedKind::PlaceExchange => self.placeexchange.is_some(),
                FeedKind::VStar => self.vstar.is_some(),
                FeedKind::SpringServe => self.springserve.is_some(),
            })
            .collect()
    }

    fn store(&self, feed: FeedKind) -> Result<Arc<dyn ObjectStore>> {
        let store = match feed {
            FeedKind::PlaceExchange => self.placeexchange.clone(),
            FeedKind::VStar => self.vstar.clone(),
            FeedKind::SpringServe => None,
        };
        store.ok_or_else(|| not_configured(feed))
    }

    fn placeexchange(&self) -> Result<placeexchange::PlaceExchangePipeline> {
        Ok(placeexchange::build_pipeline(
            &self.config.placeexchange,
            self.store(FeedKind::PlaceExchange)?,
            self.executor.clone(),
            self.config.page_size,
            self.config.retry_policy(),
        ))
    }

    fn vstar(&self) -> Result<vstar::VStarPipeline> {
        Ok(vstar::build_pipeline(
            &self.config.vstar,
            self.store(FeedKind::VStar)?,
            self.executor.clone(),
            self.config.page_size,
            self.config.retry_policy(),
        ))
    }

    fn springserve(&self) -> Result<springserve::SpringServePipeline> {
        let source = self
            .springserve
            .clone()
            .ok_or_else(|| not_configured(FeedKind::SpringServe))?;
        Ok(springserve::build_pipeline(
            &self.config.springserve,
            source,
            self.executor.clone(),
            self.config.retry_policy(),
        ))
    }

    /// Run one feed to completion
    pub async fn run(&self, feed: FeedKind) -> Result<RunStats> {
        match feed {
            FeedKind::PlaceExchange => Ok(self.placeexchange()?.run_once().await?.stats),
            FeedKind::VStar => Ok(self.vstar()?.run_once().await?.stats),
            FeedKind::SpringServe => self.springserve()?.run(Utc::now().date_naive()).await,
        }
    }

    /// What a run of `feed` would pick up, without ingesting anything
    pub async fn pending(&self, feed: FeedKind) -> Result<Pending> {
        match feed {
            FeedKind::PlaceExchange => {
                let pipeline = self.placeexchange()?;
                let watermark = pipeline.load_watermark().await?;
                Ok(Pending::Objects(pipeline.pending(&watermark).await?))
            },
            FeedKind::VStar => {
                let pipeline = self.vstar()?;
                let watermark = pipeline.load_watermark().await?;
                Ok(Pending::Objects(pipeline.pending(&watermark).await?))
            },
            FeedKind::SpringServe => Ok(Pending::ReportDays(
                self.springserve()?.pending_window(Utc::now().date_naive()).await?,
            )),
        }
    }
}

fn not_configured(feed: FeedKind) -> AdrevError {
    AdrevError::Config(format!("{} feed is not configured", feed))
}

#[async_trait]
impl FeedExecutor for FeedRunner {
    async fn run_feed(&self, feed: FeedKind) -> Result<RunStats> {
        self.run(feed).await
    }
}
