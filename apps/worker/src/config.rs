use std::time::Duration;

use ledgerfolio_core::prices::BackfillConfig;

const DEFAULT_DB_PATH: &str = "./db/ledgerfolio.db";

/// Worker settings read from `LF_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub backfill_workers: usize,
    pub backfill_queue: usize,
    pub fetch_retries: u32,
    pub fetch_retry_delay: Duration,
    pub reporting_currencies: Vec<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}='{}'", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn parse_currencies(raw: &str) -> Vec<String> {
    let mut currencies: Vec<String> = Vec::new();
    for code in raw.split(',').map(|c| c.trim().to_uppercase()) {
        if !code.is_empty() && !currencies.contains(&code) {
            currencies.push(code);
        }
    }
    currencies
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Self {
        let reporting_currencies = parse_currencies(
            &std::env::var("LF_REPORTING_CURRENCIES").unwrap_or_else(|_| "USD".to_string()),
        );

        Self {
            db_path: std::env::var("LF_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            backfill_workers: env_or("LF_BACKFILL_WORKERS", 2usize).max(1),
            backfill_queue: env_or("LF_BACKFILL_QUEUE", 64usize).max(1),
            fetch_retries: env_or("LF_FETCH_RETRIES", 2u32),
            fetch_retry_delay: Duration::from_millis(env_or("LF_FETCH_RETRY_DELAY_MS", 500u64)),
            reporting_currencies: if reporting_currencies.is_empty() {
                vec!["USD".to_string()]
            } else {
                reporting_currencies
            },
        }
    }

    pub fn backfill(&self) -> BackfillConfig {
        BackfillConfig {
            max_retries: self.fetch_retries,
            retry_delay: self.fetch_retry_delay,
        }
    }
}
