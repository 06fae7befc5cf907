//! Storage and feed contracts for the price cache.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::prices_model::{
    CachedPrice, DailyPrice, JobStatus, LatestPrice, PriceMapping, PricePopulationJob,
};
use crate::errors::Result;

/// Shared daily price cache. At most one row per `(symbol, currency, date)`.
#[async_trait]
pub trait PriceCacheStore: Send + Sync {
    /// Inserts or replaces rows by natural key. Returns the number of rows
    /// written.
    async fn upsert_prices(&self, prices: Vec<CachedPrice>) -> Result<usize>;

    fn get_price(&self, symbol: &str, currency: &str, date: NaiveDate)
        -> Result<Option<CachedPrice>>;

    /// Rows in `[start, end]`, ordered by date.
    fn get_range(
        &self,
        symbol: &str,
        currency: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CachedPrice>>;

    /// Most recent row on or before `date`.
    fn latest_on_or_before(
        &self,
        symbol: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<CachedPrice>>;
}

#[async_trait]
pub trait PriceMappingRepositoryTrait: Send + Sync {
    async fn create(&self, mapping: PriceMapping) -> Result<PriceMapping>;

    fn get_by_id(&self, mapping_id: &str) -> Result<PriceMapping>;

    fn list_for_asset(&self, asset_id: &str) -> Result<Vec<PriceMapping>>;
}

#[async_trait]
pub trait PriceJobRepositoryTrait: Send + Sync {
    async fn create(&self, job: PricePopulationJob) -> Result<PricePopulationJob>;

    /// Persists the job's current state by id.
    async fn update(&self, job: PricePopulationJob) -> Result<PricePopulationJob>;

    fn get_by_id(&self, job_id: &str) -> Result<PricePopulationJob>;

    /// Newest first.
    fn list(&self, asset_id: Option<&str>) -> Result<Vec<PricePopulationJob>>;

    fn list_by_status(&self, status: JobStatus) -> Result<Vec<PricePopulationJob>>;
}

/// External source of daily and latest prices.
#[async_trait]
pub trait PriceFeedTrait: Send + Sync {
    async fn get_daily(&self, symbol: &str, currency: &str, date: NaiveDate)
        -> Result<DailyPrice>;

    async fn get_latest(&self, symbol: &str, currency: &str) -> Result<LatestPrice>;
}

/// Receives every persisted job state change.
pub trait JobObserver: Send + Sync {
    fn on_job_update(&self, job: &PricePopulationJob);
}

/// Observer that ignores updates.
pub struct NoopJobObserver;

impl JobObserver for NoopJobObserver {
    fn on_job_update(&self, _job: &PricePopulationJob) {}
}
