//! Daily and latest prices for a single provider symbol.
//!
//! `ledgerfolio-core` drives a [`MarketDataProvider`] one day at a time
//! during backfill and uses [`MarketDataError::retry_class`] to decide
//! whether a failed call is worth repeating.

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::{PriceRequest, Quote};
pub use provider::yahoo::YahooProvider;
pub use provider::{MarketDataProvider, ProviderCapabilities, RateLimit};
