use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One provider symbol, priced in the currency the caller expects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceRequest {
    pub symbol: String,
    pub currency: String,
}

impl PriceRequest {
    pub fn new(symbol: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            currency: currency.into(),
        }
    }
}

/// A closing price as reported by a provider. Latest quotes carry the
/// current price in `close`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub timestamp: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::str")]
    pub close: Decimal,
    pub currency: String,
    pub source: String,
}

impl Quote {
    pub fn new(timestamp: DateTime<Utc>, close: Decimal, currency: String, source: String) -> Self {
        Self {
            timestamp,
            close,
            currency,
            source,
        }
    }

    /// UTC calendar day of the bar.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}
