use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use ledgerfolio_core::positions::PositionService;
use ledgerfolio_core::prices::{BackfillService, MarketDataPriceFeed};
use ledgerfolio_core::transactions::TransactionService;
use ledgerfolio_market_data::YahooProvider;
use ledgerfolio_storage_sqlite::{
    db, AccountRepository, AssetRepository, PositionRepository, PriceCacheRepository,
    PriceJobRepository, PriceMappingRepository, TransactionRepository,
};

use crate::config::Config;

pub struct AppState {
    pub backfill_service: Arc<BackfillService>,
    pub transaction_service: Arc<TransactionService>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("LF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Opens the database, applies migrations and wires repositories into the
/// services the worker drives. Must be called inside a tokio runtime.
pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let account_repository = Arc::new(AccountRepository::new(pool.clone(), writer.clone()));
    let asset_repository = Arc::new(AssetRepository::new(pool.clone(), writer.clone()));
    let position_repository = Arc::new(PositionRepository::new(pool.clone(), writer.clone()));
    let transaction_repository =
        Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
    let price_cache = Arc::new(PriceCacheRepository::new(pool.clone(), writer.clone()));
    let mapping_repository = Arc::new(PriceMappingRepository::new(pool.clone(), writer.clone()));
    let job_repository = Arc::new(PriceJobRepository::new(pool.clone(), writer));

    let provider = Arc::new(YahooProvider::new()?);
    let feed = Arc::new(MarketDataPriceFeed::new(provider));
    let backfill_service = Arc::new(
        BackfillService::new(
            job_repository,
            mapping_repository,
            asset_repository.clone(),
            price_cache,
            feed,
        )
        .with_config(config.backfill()),
    );

    let position_service = Arc::new(PositionService::new(position_repository, asset_repository));
    let transaction_service = Arc::new(TransactionService::new(
        transaction_repository,
        account_repository,
        position_service,
        config.reporting_currencies.clone(),
    ));

    Ok(AppState {
        backfill_service,
        transaction_service,
        db_path,
    })
}
