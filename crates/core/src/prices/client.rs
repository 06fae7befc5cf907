//! Price feed backed by a `ledgerfolio-market-data` provider.
//!
//! ```text
//! BackfillService ─▶ MarketDataPriceFeed ─▶ MarketDataProvider (Yahoo, ...)
//!                          │
//!                          └─ pacing: at most one call per provider `min_delay`
//! ```

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use log::debug;
use tokio::sync::Mutex;

use super::prices_model::{DailyPrice, LatestPrice};
use super::prices_traits::PriceFeedTrait;
use crate::constants::PRICE_LOOKBACK_DAYS;
use crate::errors::{Result, ValidationError};

use ledgerfolio_market_data::{MarketDataError, MarketDataProvider, PriceRequest};

pub struct MarketDataPriceFeed {
    provider: Arc<dyn MarketDataProvider>,
    last_call: Mutex<Option<Instant>>,
}

impl MarketDataPriceFeed {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            last_call: Mutex::new(None),
        }
    }

    /// Waits until the provider's minimum delay since the previous call has
    /// passed.
    async fn pace(&self) {
        let min_delay = self.provider.rate_limit().min_delay;
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < min_delay {
                tokio::time::sleep(min_delay - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[async_trait]
impl PriceFeedTrait for MarketDataPriceFeed {
    /// Close for `date`, or the last close before it within the lookback
    /// window when the market was shut that day.
    async fn get_daily(
        &self,
        symbol: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<DailyPrice> {
        let window_start = date - Duration::days(PRICE_LOOKBACK_DAYS);
        let (Some(start), Some(end)) = (
            window_start.and_hms_opt(0, 0, 0),
            date.and_hms_opt(23, 59, 59),
        ) else {
            return Err(ValidationError::InvalidInput(format!("Invalid price date {}", date)).into());
        };

        if !self.provider.capabilities().supports_historical {
            return Err(MarketDataError::not_supported("historical", self.provider.id()).into());
        }
        let request = PriceRequest::new(symbol, currency);
        self.pace().await;
        let quotes = self
            .provider
            .get_historical_quotes(&request, Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end))
            .await?;

        let quote = quotes
            .into_iter()
            .filter(|q| q.date() <= date)
            .max_by_key(|q| q.timestamp)
            .ok_or(MarketDataError::NoDataForRange)?;

        debug!(
            "{} {} on {}: {} (quote from {})",
            symbol,
            currency,
            date,
            quote.close,
            quote.date()
        );
        Ok(DailyPrice {
            date,
            price: quote.close,
            source: quote.source,
        })
    }

    async fn get_latest(&self, symbol: &str, currency: &str) -> Result<LatestPrice> {
        if !self.provider.capabilities().supports_latest {
            return Err(MarketDataError::not_supported("latest", self.provider.id()).into());
        }
        let request = PriceRequest::new(symbol, currency);
        self.pace().await;
        let quote = self.provider.get_latest_quote(&request).await?;
        Ok(LatestPrice {
            price: quote.close,
            as_of: quote.timestamp,
            source: quote.source,
        })
    }
}
