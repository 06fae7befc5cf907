//! Price backfill service.
//!
//! A job walks its date range one day at a time:
//!
//! ```text
//! PENDING ──run──▶ RUNNING ──all days cached──▶ COMPLETED
//!                     │
//!                     ├── fetch failed ──▶ FAILED ("<date>: <message>")
//!                     └── cancelled ─────▶ FAILED ("cancelled")
//! ```
//!
//! Every state change is persisted before the next step, so a process that
//! dies mid-run leaves a RUNNING job whose `completed_days` says where to
//! resume. Cache writes are upserts by natural key, which makes repeating a
//! day harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use tokio::sync::watch;

use super::prices_model::{
    CachedPrice, DailyPrice, JobStatus, NewPriceMapping, PriceMapping, PricePopulationJob,
    CANCELLED_MESSAGE,
};
use super::prices_traits::{
    JobObserver, NoopJobObserver, PriceCacheStore, PriceFeedTrait, PriceJobRepositoryTrait,
    PriceMappingRepositoryTrait,
};
use crate::assets::AssetRepositoryTrait;
use crate::errors::{Result, ValidationError};
use crate::Error;

use ledgerfolio_market_data::RetryClass;

/// Tunables for fetching during a backfill run.
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// Extra attempts after a transient feed error.
    pub max_retries: u32,
    /// Delay before the first retry; grows linearly with each attempt.
    pub retry_delay: Duration,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

fn is_transient(err: &Error) -> bool {
    matches!(err, Error::MarketData(e) if e.retry_class() == RetryClass::WithBackoff)
}

fn failure_message(date: NaiveDate, err: &Error) -> String {
    match err {
        Error::MarketData(e) => format!("{}: {}", date, e),
        other => format!("{}: {}", date, other),
    }
}

pub struct BackfillService {
    job_repository: Arc<dyn PriceJobRepositoryTrait>,
    mapping_repository: Arc<dyn PriceMappingRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    price_cache: Arc<dyn PriceCacheStore>,
    feed: Arc<dyn PriceFeedTrait>,
    observer: Arc<dyn JobObserver>,
    config: BackfillConfig,
}

impl BackfillService {
    pub fn new(
        job_repository: Arc<dyn PriceJobRepositoryTrait>,
        mapping_repository: Arc<dyn PriceMappingRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        price_cache: Arc<dyn PriceCacheStore>,
        feed: Arc<dyn PriceFeedTrait>,
    ) -> Self {
        Self {
            job_repository,
            mapping_repository,
            asset_repository,
            price_cache,
            feed,
            observer: Arc::new(NoopJobObserver),
            config: BackfillConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BackfillConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub async fn create_mapping(&self, new_mapping: NewPriceMapping) -> Result<PriceMapping> {
        new_mapping.validate()?;
        self.asset_repository.get_by_id(&new_mapping.asset_id)?;
        let mapping = new_mapping.into_mapping(Utc::now());
        info!(
            "Mapping asset {} to {} {} on {}",
            mapping.asset_id, mapping.provider_symbol, mapping.currency, mapping.provider
        );
        self.mapping_repository.create(mapping).await
    }

    pub fn list_mappings(&self, asset_id: &str) -> Result<Vec<PriceMapping>> {
        self.mapping_repository.list_for_asset(asset_id)
    }

    pub async fn create_job(
        &self,
        asset_id: &str,
        mapping_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PricePopulationJob> {
        self.asset_repository.get_by_id(asset_id)?;
        let mapping = self.mapping_repository.get_by_id(mapping_id)?;
        if mapping.asset_id != asset_id {
            return Err(ValidationError::InvalidInput(format!(
                "Mapping {} does not price asset {}",
                mapping_id, asset_id
            ))
            .into());
        }
        if !mapping.is_active {
            return Err(ValidationError::InvalidInput(format!(
                "Mapping {} is inactive",
                mapping_id
            ))
            .into());
        }

        let job = PricePopulationJob::new(asset_id, mapping_id, start_date, end_date, Utc::now())?;
        info!(
            "Created backfill job {} for {} ({} to {}, {} days)",
            job.id, asset_id, start_date, end_date, job.total_days
        );
        let job = self.job_repository.create(job).await?;
        self.observer.on_job_update(&job);
        Ok(job)
    }

    async fn persist(&self, job: PricePopulationJob) -> Result<PricePopulationJob> {
        let saved = self.job_repository.update(job).await?;
        self.observer.on_job_update(&saved);
        Ok(saved)
    }

    async fn fetch_with_retry(&self, mapping: &PriceMapping, date: NaiveDate) -> Result<DailyPrice> {
        let mut attempt = 0;
        loop {
            match self
                .feed
                .get_daily(&mapping.provider_symbol, &mapping.currency, date)
                .await
            {
                Ok(price) => return Ok(price),
                Err(e) if is_transient(&e) && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.retry_delay * attempt;
                    warn!(
                        "Fetching {} for {} failed ({}), retry {}/{} in {:?}",
                        mapping.provider_symbol, date, e, attempt, self.config.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Runs a PENDING job, or resumes an interrupted RUNNING one, until it
    /// completes, fails or is cancelled.
    ///
    /// Feed failures end the job as FAILED and are returned as `Ok`. Storage
    /// failures are returned as `Err` and leave the job RUNNING so it can be
    /// resumed.
    pub async fn run_job(
        &self,
        job_id: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<PricePopulationJob> {
        let mut job = self.job_repository.get_by_id(job_id)?;
        let resumed = job.status == JobStatus::Running;
        job.start(Utc::now())?;
        let mapping = self.mapping_repository.get_by_id(&job.mapping_id)?;
        job = self.persist(job).await?;

        info!(
            "{} backfill job {} for {} at day {}/{}",
            if resumed { "Resuming" } else { "Starting" },
            job.id,
            mapping.provider_symbol,
            job.completed_days,
            job.total_days
        );

        while let Some(date) = job.next_date() {
            if *cancel.borrow() {
                info!("Backfill job {} cancelled before {}", job.id, date);
                job.fail(CANCELLED_MESSAGE, Utc::now())?;
                return self.persist(job).await;
            }

            job.begin_day(date, Utc::now());
            job = self.persist(job).await?;

            let daily = match self.fetch_with_retry(&mapping, date).await {
                Ok(daily) => daily,
                Err(e) => {
                    warn!("Backfill job {} failed on {}: {}", job.id, date, e);
                    job.fail(failure_message(date, &e), Utc::now())?;
                    return self.persist(job).await;
                }
            };

            let row = CachedPrice::new(
                &mapping.provider_symbol,
                &mapping.currency,
                date,
                daily.price,
                &daily.source,
                Utc::now(),
            );
            self.price_cache.upsert_prices(vec![row]).await?;
            debug!("Cached {} {} for {}", mapping.provider_symbol, daily.price, date);

            job.finish_day(Utc::now());
            job = self.persist(job).await?;
        }

        job.complete(Utc::now())?;
        info!(
            "Backfill job {} completed ({} days)",
            job.id, job.completed_days
        );
        self.persist(job).await
    }

    pub fn get_job(&self, job_id: &str) -> Result<PricePopulationJob> {
        self.job_repository.get_by_id(job_id)
    }

    pub fn list_jobs(&self, asset_id: Option<&str>) -> Result<Vec<PricePopulationJob>> {
        self.job_repository.list(asset_id)
    }

    /// Jobs a previous process left RUNNING.
    pub fn interrupted_jobs(&self) -> Result<Vec<PricePopulationJob>> {
        self.job_repository.list_by_status(JobStatus::Running)
    }

    pub fn pending_jobs(&self) -> Result<Vec<PricePopulationJob>> {
        self.job_repository.list_by_status(JobStatus::Pending)
    }

    pub fn get_cached_price(
        &self,
        symbol: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<CachedPrice>> {
        self.price_cache.get_price(symbol, currency, date)
    }

    pub fn get_cached_range(
        &self,
        symbol: &str,
        currency: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CachedPrice>> {
        if start > end {
            return Err(ValidationError::InvalidDateRange { start, end }.into());
        }
        self.price_cache.get_range(symbol, currency, start, end)
    }
}
