//! Price cache and backfill job models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, Result, ValidationError};
use crate::utils::time_utils::{inclusive_day_count, nth_day};
use crate::Error;

/// Message recorded on a job stopped by its handle.
pub const CANCELLED_MESSAGE: &str = "cancelled";

/// Builds the cache row id from its natural key.
///
/// Format: `{SYMBOL}_{CURRENCY}_{YYYY-MM-DD}`
pub fn cached_price_id(symbol: &str, currency: &str, date: NaiveDate) -> String {
    format!(
        "{}_{}_{}",
        symbol.to_uppercase(),
        currency.to_uppercase(),
        date
    )
}

/// One daily close in the shared price cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPrice {
    pub id: String,
    pub symbol: String,
    pub currency: String,
    pub date: NaiveDate,
    pub price: Decimal,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

impl CachedPrice {
    pub fn new(
        symbol: &str,
        currency: &str,
        date: NaiveDate,
        price: Decimal,
        source: &str,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: cached_price_id(symbol, currency, date),
            symbol: symbol.to_uppercase(),
            currency: currency.to_uppercase(),
            date,
            price,
            source: source.to_string(),
            fetched_at,
        }
    }
}

/// Tells the backfill job which provider symbol prices an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceMapping {
    pub id: String,
    pub asset_id: String,
    pub provider_symbol: String,
    pub currency: String,
    pub provider: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPriceMapping {
    pub asset_id: String,
    pub provider_symbol: String,
    pub currency: String,
    pub provider: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl NewPriceMapping {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("assetId", &self.asset_id),
            ("providerSymbol", &self.provider_symbol),
            ("currency", &self.currency),
            ("provider", &self.provider),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field.to_string()).into());
            }
        }
        Ok(())
    }

    pub fn into_mapping(self, at: DateTime<Utc>) -> PriceMapping {
        PriceMapping {
            id: Uuid::new_v4().to_string(),
            asset_id: self.asset_id,
            provider_symbol: self.provider_symbol.trim().to_string(),
            currency: self.currency.trim().to_uppercase(),
            provider: self.provider.trim().to_uppercase(),
            is_active: self.is_active,
            created_at: at,
        }
    }
}

/// Price for one day as returned by a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPrice {
    pub date: NaiveDate,
    pub price: Decimal,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatestPrice {
    pub price: Decimal,
    pub as_of: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "RUNNING" => Ok(JobStatus::Running),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            other => {
                Err(ValidationError::InvalidInput(format!("Unknown job status '{}'", other)).into())
            }
        }
    }
}

/// Day-by-day price backfill for one asset.
///
/// `completed_days` is the resume cursor: the next day to fetch is
/// `start_date + completed_days`. `current_date` is the day in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePopulationJob {
    pub id: String,
    pub asset_id: String,
    pub mapping_id: String,
    pub status: JobStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub current_date: Option<NaiveDate>,
    pub total_days: i32,
    pub completed_days: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl PricePopulationJob {
    pub fn new(
        asset_id: &str,
        mapping_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        if start_date > end_date {
            return Err(ValidationError::InvalidDateRange {
                start: start_date,
                end: end_date,
            }
            .into());
        }
        let total_days = i32::try_from(inclusive_day_count(start_date, end_date))
            .map_err(|_| ValidationError::InvalidInput("Date range is too long".to_string()))?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            asset_id: asset_id.to_string(),
            mapping_id: mapping_id.to_string(),
            status: JobStatus::Pending,
            start_date,
            end_date,
            current_date: None,
            total_days,
            completed_days: 0,
            error_message: None,
            created_at: at,
            started_at: None,
            completed_at: None,
            updated_at: at,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Next day to fetch, `None` once every day is done.
    pub fn next_date(&self) -> Option<NaiveDate> {
        if self.completed_days >= self.total_days {
            return None;
        }
        nth_day(self.start_date, i64::from(self.completed_days))
    }

    fn ensure_not_terminal(&self) -> Result<()> {
        if self.is_terminal() {
            return Err(DomainError::JobTerminal {
                job_id: self.id.clone(),
                status: self.status.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// PENDING → RUNNING. A RUNNING job (interrupted run) stays RUNNING and
    /// keeps its original `started_at`.
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.ensure_not_terminal()?;
        self.status = JobStatus::Running;
        self.started_at.get_or_insert(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn begin_day(&mut self, date: NaiveDate, at: DateTime<Utc>) {
        self.current_date = Some(date);
        self.updated_at = at;
    }

    pub fn finish_day(&mut self, at: DateTime<Utc>) {
        self.completed_days += 1;
        self.updated_at = at;
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.ensure_not_terminal()?;
        self.status = JobStatus::Completed;
        self.completed_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
        self.ensure_not_terminal()?;
        self.status = JobStatus::Failed;
        self.error_message = Some(message.into());
        self.completed_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn progress_percent(&self) -> Decimal {
        if self.total_days == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.completed_days) * Decimal::ONE_HUNDRED / Decimal::from(self.total_days))
            .round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_cached_price_id_is_natural_key() {
        let a = CachedPrice::new("btc-usd", "usd", d(2024, 1, 5), dec!(1), "YAHOO", now());
        let b = CachedPrice::new("BTC-USD", "USD", d(2024, 1, 5), dec!(2), "MANUAL", now());
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, "BTC-USD_USD_2024-01-05");
    }

    #[test]
    fn test_new_job_counts_days_inclusively() {
        let job = PricePopulationJob::new("BTC", "m1", d(2024, 1, 1), d(2024, 1, 10), now()).unwrap();
        assert_eq!(job.total_days, 10);
        assert_eq!(job.completed_days, 0);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.next_date(), Some(d(2024, 1, 1)));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = PricePopulationJob::new("BTC", "m1", d(2024, 1, 2), d(2024, 1, 1), now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_restart_keeps_started_at_and_cursor() {
        let mut job =
            PricePopulationJob::new("BTC", "m1", d(2024, 1, 1), d(2024, 1, 3), now()).unwrap();
        job.start(now()).unwrap();
        job.begin_day(d(2024, 1, 1), now());
        job.finish_day(now());

        let later = DateTime::from_timestamp(1_700_000_600, 0).unwrap();
        job.start(later).unwrap();
        assert_eq!(job.started_at, Some(now()));
        assert_eq!(job.next_date(), Some(d(2024, 1, 2)));
        assert_eq!(job.progress_percent(), dec!(33.33));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job =
            PricePopulationJob::new("BTC", "m1", d(2024, 1, 1), d(2024, 1, 1), now()).unwrap();
        job.start(now()).unwrap();
        job.fail(CANCELLED_MESSAGE, now()).unwrap();

        assert_eq!(job.error_message.as_deref(), Some("cancelled"));
        assert_eq!(job.start(now()).unwrap_err().kind(), ErrorKind::Domain);
        assert!(job.complete(now()).is_err());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::from_str(status.as_str()).unwrap(), status);
        }
    }
}
