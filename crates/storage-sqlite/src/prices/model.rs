//! Database models for prices.

use diesel::prelude::*;
use log::warn;

use ledgerfolio_core::prices::{
    cached_price_id, CachedPrice, JobStatus, PriceMapping, PricePopulationJob,
};

use crate::utils::{format_date, format_timestamp, parse_date, parse_decimal, parse_timestamp};

/// One row of `price_cache`.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::price_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CachedPriceDB {
    pub id: String,
    pub symbol: String,
    pub currency: String,
    pub date: String,
    pub price: String,
    pub source: String,
    pub fetched_at: String,
}

impl From<&CachedPrice> for CachedPriceDB {
    fn from(price: &CachedPrice) -> Self {
        Self {
            id: cached_price_id(&price.symbol, &price.currency, price.date),
            symbol: price.symbol.to_uppercase(),
            currency: price.currency.to_uppercase(),
            date: format_date(&price.date),
            price: price.price.to_string(),
            source: price.source.clone(),
            fetched_at: format_timestamp(&price.fetched_at),
        }
    }
}

impl From<CachedPriceDB> for CachedPrice {
    fn from(db: CachedPriceDB) -> Self {
        Self {
            date: parse_date(&db.date),
            price: parse_decimal(&db.price),
            fetched_at: parse_timestamp(&db.fetched_at),
            id: db.id,
            symbol: db.symbol,
            currency: db.currency,
            source: db.source,
        }
    }
}

/// One row of `price_mappings`.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::price_mappings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceMappingDB {
    pub id: String,
    pub asset_id: String,
    pub provider_symbol: String,
    pub currency: String,
    pub provider: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<&PriceMapping> for PriceMappingDB {
    fn from(mapping: &PriceMapping) -> Self {
        Self {
            id: mapping.id.clone(),
            asset_id: mapping.asset_id.clone(),
            provider_symbol: mapping.provider_symbol.clone(),
            currency: mapping.currency.clone(),
            provider: mapping.provider.clone(),
            is_active: mapping.is_active,
            created_at: format_timestamp(&mapping.created_at),
        }
    }
}

impl From<PriceMappingDB> for PriceMapping {
    fn from(db: PriceMappingDB) -> Self {
        Self {
            created_at: parse_timestamp(&db.created_at),
            id: db.id,
            asset_id: db.asset_id,
            provider_symbol: db.provider_symbol,
            currency: db.currency,
            provider: db.provider,
            is_active: db.is_active,
        }
    }
}

/// One row of `price_population_jobs`. The day in flight is stored as
/// `current_day`.
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::price_population_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct PriceJobDB {
    pub id: String,
    pub asset_id: String,
    pub mapping_id: String,
    pub status: String,
    pub start_date: String,
    pub end_date: String,
    pub current_day: Option<String>,
    pub total_days: i32,
    pub completed_days: i32,
    pub error_message: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub updated_at: String,
}

impl From<&PricePopulationJob> for PriceJobDB {
    fn from(job: &PricePopulationJob) -> Self {
        Self {
            id: job.id.clone(),
            asset_id: job.asset_id.clone(),
            mapping_id: job.mapping_id.clone(),
            status: job.status.as_str().to_string(),
            start_date: format_date(&job.start_date),
            end_date: format_date(&job.end_date),
            current_day: job.current_date.as_ref().map(format_date),
            total_days: job.total_days,
            completed_days: job.completed_days,
            error_message: job.error_message.clone(),
            created_at: format_timestamp(&job.created_at),
            started_at: job.started_at.as_ref().map(format_timestamp),
            completed_at: job.completed_at.as_ref().map(format_timestamp),
            updated_at: format_timestamp(&job.updated_at),
        }
    }
}

impl From<PriceJobDB> for PricePopulationJob {
    fn from(db: PriceJobDB) -> Self {
        // An unreadable status is treated as failed so the job is never rerun.
        let status = db.status.parse().unwrap_or_else(|e| {
            warn!("Job {} has unknown status: {}", db.id, e);
            JobStatus::Failed
        });
        Self {
            status,
            start_date: parse_date(&db.start_date),
            end_date: parse_date(&db.end_date),
            current_date: db.current_day.as_deref().map(parse_date),
            started_at: db.started_at.as_deref().map(parse_timestamp),
            completed_at: db.completed_at.as_deref().map(parse_timestamp),
            created_at: parse_timestamp(&db.created_at),
            updated_at: parse_timestamp(&db.updated_at),
            id: db.id,
            asset_id: db.asset_id,
            mapping_id: db.mapping_id,
            total_days: db.total_days,
            completed_days: db.completed_days,
            error_message: db.error_message,
        }
    }
}
