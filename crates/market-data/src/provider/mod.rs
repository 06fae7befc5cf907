//! Price sources. Each one implements [`MarketDataProvider`].

mod traits;

pub mod yahoo;

pub use traits::{MarketDataProvider, ProviderCapabilities, RateLimit};
