//! Prices module - daily price cache and the jobs that fill it.
//!
//! - [`prices_model`] - cached prices, price mappings and backfill jobs
//! - [`prices_traits`] - storage, feed and observer contracts
//! - [`client`] - price feed over a `ledgerfolio-market-data` provider
//! - [`backfill`] - the job state machine
//! - [`worker`] - bounded queue of jobs served by tokio tasks

pub mod backfill;
pub mod client;
pub mod prices_model;
pub mod prices_traits;
pub mod worker;

#[cfg(test)]
mod backfill_tests;

pub use backfill::{BackfillConfig, BackfillService};
pub use client::MarketDataPriceFeed;
pub use prices_model::{
    cached_price_id, CachedPrice, DailyPrice, JobStatus, LatestPrice, NewPriceMapping,
    PriceMapping, PricePopulationJob, CANCELLED_MESSAGE,
};
pub use prices_traits::{
    JobObserver, NoopJobObserver, PriceCacheStore, PriceFeedTrait, PriceJobRepositoryTrait,
    PriceMappingRepositoryTrait,
};
pub use worker::{BackfillWorker, JobHandle};
