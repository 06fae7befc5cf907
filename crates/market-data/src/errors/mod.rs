//! Provider errors and how the backfill job should react to them.

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The symbol exists but the provider has no bar in the window asked for.
    #[error("No data for date range")]
    NoDataForRange,

    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// Upstream 5xx, malformed payload and anything else the provider
    /// client reports without a more specific meaning.
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    #[error("Operation '{operation}' not supported by {provider}")]
    NotSupported { operation: String, provider: String },

    /// A bar came back but its values cannot be stored as a price.
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    pub fn not_supported(operation: &str, provider: &str) -> Self {
        Self::NotSupported {
            operation: operation.to_string(),
            provider: provider.to_string(),
        }
    }

    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::ProviderError { .. }
            | Self::Network(_) => RetryClass::WithBackoff,
            Self::SymbolNotFound(_)
            | Self::NoDataForRange
            | Self::NotSupported { .. }
            | Self::ValidationFailed { .. } => RetryClass::Never,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.retry_class() == RetryClass::WithBackoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yahoo() -> String {
        "YAHOO".to_string()
    }

    #[test]
    fn upstream_failures_are_transient() {
        let transient = [
            MarketDataError::RateLimited { provider: yahoo() },
            MarketDataError::Timeout { provider: yahoo() },
            MarketDataError::ProviderError {
                provider: yahoo(),
                message: "502 from chart endpoint".to_string(),
            },
        ];
        for err in transient {
            assert!(err.is_transient(), "{err} should be retried");
        }
    }

    #[test]
    fn bad_requests_are_terminal() {
        let terminal = [
            MarketDataError::SymbolNotFound("NOPE-USD".to_string()),
            MarketDataError::NoDataForRange,
            MarketDataError::not_supported("latest", "YAHOO"),
            MarketDataError::ValidationFailed {
                message: "close is negative".to_string(),
            },
        ];
        for err in terminal {
            assert_eq!(err.retry_class(), RetryClass::Never, "{err}");
        }
    }

    #[test]
    fn messages_name_the_provider() {
        let err = MarketDataError::ProviderError {
            provider: yahoo(),
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Provider error: YAHOO - bad gateway");
        assert_eq!(
            MarketDataError::not_supported("historical", "STUB").to_string(),
            "Operation 'historical' not supported by STUB"
        );
    }
}
