use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::MarketDataError;
use crate::models::{PriceRequest, Quote};

/// Which of the two quote calls a provider answers.
#[derive(Clone, Copy, Debug)]
pub struct ProviderCapabilities {
    pub supports_historical: bool,
    pub supports_latest: bool,
}

/// Pacing the caller must respect. `min_delay` is enforced between
/// consecutive calls; `requests_per_minute` is informational.
#[derive(Clone, Debug)]
pub struct RateLimit {
    pub requests_per_minute: u32,
    pub min_delay: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            min_delay: Duration::from_secs(1),
        }
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Stable provider code, recorded as the `source` of every price it
    /// produced.
    fn id(&self) -> &'static str;

    fn capabilities(&self) -> ProviderCapabilities;

    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    async fn get_latest_quote(&self, request: &PriceRequest) -> Result<Quote, MarketDataError>;

    /// Daily bars with timestamps in `[start, end]`, oldest first.
    async fn get_historical_quotes(
        &self,
        request: &PriceRequest,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>, MarketDataError>;
}
