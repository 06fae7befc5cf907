//! Yahoo Finance chart API. Covers equities (`SHOP.TO`), crypto pairs
//! (`BTC-USD`) and FX crosses (`EURUSD=X`) under their Yahoo symbols.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::{PriceRequest, Quote};
use crate::provider::{MarketDataProvider, ProviderCapabilities, RateLimit};

const PROVIDER_ID: &str = "YAHOO";

pub struct YahooProvider {
    connector: yahoo::YahooConnector,
}

impl YahooProvider {
    pub fn new() -> Result<Self, MarketDataError> {
        let connector = yahoo::YahooConnector::new().map_err(|e| {
            provider_error(format!("Failed to initialize Yahoo connector: {}", e))
        })?;
        Ok(Self { connector })
    }
}

fn provider_error(message: String) -> MarketDataError {
    MarketDataError::ProviderError {
        provider: PROVIDER_ID.to_string(),
        message,
    }
}

fn to_offset(dt: DateTime<Utc>) -> Result<OffsetDateTime, MarketDataError> {
    OffsetDateTime::from_unix_timestamp(dt.timestamp()).map_err(|e| {
        MarketDataError::ValidationFailed {
            message: format!("Timestamp {} out of range: {}", dt, e),
        }
    })
}

/// `NoQuotes`/`NoResult` from the chart endpoint mean Yahoo does not know
/// the symbol. Everything else is treated as an upstream failure.
fn classify(symbol: &str, err: yahoo::YahooError) -> MarketDataError {
    match err {
        yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult => {
            MarketDataError::SymbolNotFound(symbol.to_string())
        }
        other => provider_error(other.to_string()),
    }
}

fn to_quote(bar: &yahoo::Quote, currency: &str) -> Result<Quote, MarketDataError> {
    close_quote(bar.timestamp as i64, bar.close, currency)
}

fn close_quote(seconds: i64, close: f64, currency: &str) -> Result<Quote, MarketDataError> {
    let timestamp = Utc
        .timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("Invalid bar timestamp {}", seconds),
        })?;
    let close = Decimal::from_f64_retain(close)
        .filter(|c| !c.is_sign_negative())
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("Unusable close {} at {}", close, timestamp),
        })?;

    Ok(Quote::new(
        timestamp,
        close,
        currency.to_string(),
        PROVIDER_ID.to_string(),
    ))
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_historical: true,
            supports_latest: true,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 120,
            min_delay: Duration::from_millis(250),
        }
    }

    async fn get_latest_quote(&self, request: &PriceRequest) -> Result<Quote, MarketDataError> {
        debug!("Yahoo latest {}", request.symbol);
        let response = self
            .connector
            .get_latest_quotes(&request.symbol, "1d")
            .await
            .map_err(|e| classify(&request.symbol, e))?;
        let bar = response
            .last_quote()
            .map_err(|e| classify(&request.symbol, e))?;
        to_quote(&bar, &request.currency)
    }

    async fn get_historical_quotes(
        &self,
        request: &PriceRequest,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>, MarketDataError> {
        debug!(
            "Yahoo history {} {}..{}",
            request.symbol,
            start.date_naive(),
            end.date_naive()
        );
        let response = self
            .connector
            .get_quote_history(&request.symbol, to_offset(start)?, to_offset(end)?)
            .await
            .map_err(|e| classify(&request.symbol, e))?;

        let bars = match response.quotes() {
            Ok(bars) => bars,
            Err(yahoo::YahooError::NoQuotes) => return Err(MarketDataError::NoDataForRange),
            Err(e) => return Err(provider_error(e.to_string())),
        };

        let mut quotes = Vec::with_capacity(bars.len());
        for bar in &bars {
            match to_quote(bar, &request.currency) {
                Ok(quote) => quotes.push(quote),
                Err(e) => warn!("Dropping {} bar: {}", request.symbol, e),
            }
        }
        if quotes.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }
        quotes.sort_by_key(|q| q.timestamp);
        Ok(quotes)
    }
}
