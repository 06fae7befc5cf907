//! SQLite storage for the daily price cache, price mappings and backfill jobs.

mod cache_repository;
mod job_repository;
mod mapping_repository;
mod model;

pub use cache_repository::PriceCacheRepository;
pub use job_repository::PriceJobRepository;
pub use mapping_repository::PriceMappingRepository;
pub use model::{CachedPriceDB, PriceJobDB, PriceMappingDB};
