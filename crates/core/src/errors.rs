//! Core error types for the Ledgerfolio engine.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.
//! Every error maps to a stable [`ErrorKind`] so callers can branch on the
//! category without matching on messages.

use chrono::{NaiveDate, ParseError as ChronoParseError};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use ledgerfolio_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-checkable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Input rejected before any state was touched.
    Validation,
    /// An aggregate invariant would be violated.
    Domain,
    /// The referenced entity does not exist.
    NotFound,
    /// An external collaborator (price feed) failed.
    External,
    /// The persistence layer failed.
    Storage,
    /// Anything else.
    Internal,
}

/// Root error type for the ledger engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Operation rejected: {0}")]
    Domain(#[from] DomainError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Builds a `NotFound` error naming the entity and its id.
    pub fn not_found(entity: &str, id: &str) -> Self {
        Error::NotFound(format!("{} '{}'", entity, id))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Domain(_) => ErrorKind::Domain,
            Error::NotFound(_) | Error::Database(DatabaseError::NotFound(_)) => {
                ErrorKind::NotFound
            }
            Error::MarketData(_) => ErrorKind::External,
            Error::Database(_) => ErrorKind::Storage,
            Error::Unexpected(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint was violated.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Invariant violations raised by the position, vault and job state machines.
///
/// The aggregate is left untouched whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Insufficient quantity: requested {requested}, available {available}")]
    InsufficientQuantity {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Position {0} is closed")]
    PositionClosed(String),

    #[error("Position still holds {remaining}; use a forced close to write it off")]
    PositionStillOpen { remaining: Decimal },

    #[error("Withdrawal quantity must be positive, got {0}")]
    NonPositiveWithdrawal(Decimal),

    #[error("Invalid manual share price {0}")]
    InvalidManualPrice(Decimal),

    #[error("Total value must be positive, got {0}")]
    InvalidTotalValue(Decimal),

    #[error("Manual pricing is not enabled for vault {0}")]
    ManualPricingNotEnabled(String),

    #[error("Manual pricing is already enabled for vault {0}")]
    ManualPricingAlreadyEnabled(String),

    #[error("Adjusted reference value must be positive, got {0}")]
    InvalidReferenceValue(Decimal),

    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Amount {requested} exceeds assets under management {available}")]
    InsufficientAum {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Job {job_id} is already {status}")]
    JobTerminal { job_id: String, status: String },

    #[error("Vault {0} is closed")]
    VaultClosed(String),

    #[error("Vault still has {supply} shares outstanding")]
    VaultNotEmpty { supply: Decimal },
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("'{field}' must be positive, got {value}")]
    NonPositive { field: String, value: Decimal },

    #[error("'{field}' must not be negative, got {value}")]
    Negative { field: String, value: Decimal },

    #[error("No exchange rate for reporting currency {0} in the snapshot")]
    MissingFxRate(String),

    #[error("Exchange rate for {currency} must be positive, got {rate}")]
    InvalidFxRate { currency: String, rate: Decimal },

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

impl ValidationError {
    pub fn non_positive(field: &str, value: Decimal) -> Self {
        ValidationError::NonPositive {
            field: field.to_string(),
            value,
        }
    }

    pub fn negative(field: &str, value: Decimal) -> Self {
        ValidationError::Negative {
            field: field.to_string(),
            value,
        }
    }
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::from(ValidationError::MissingField("accountId".into())).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::from(DomainError::NonPositiveWithdrawal(dec!(0))).kind(),
            ErrorKind::Domain
        );
        assert_eq!(Error::not_found("Vault", "v1").kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::from(DatabaseError::NotFound("row".into())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::from(DatabaseError::QueryFailed("locked".into())).kind(),
            ErrorKind::Storage
        );
        assert_eq!(
            Error::from(MarketDataError::NoDataForRange).kind(),
            ErrorKind::External
        );
        assert_eq!(Error::Unexpected("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            Error::not_found("Vault", "v1").to_string(),
            "Vault 'v1' not found"
        );
    }
}
