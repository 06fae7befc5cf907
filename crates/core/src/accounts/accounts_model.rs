//! Account domain models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, Error, Result};

/// Kind of account a transaction is booked against.
///
/// Credit-style accounts (`CREDIT_CARD`, `CREDIT_LINE`) carry a liability:
/// an expense paid from them is absorbed by the balance owed rather than
/// leaving the portfolio as cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    #[default]
    Cash,
    Bank,
    Brokerage,
    Exchange,
    Wallet,
    CreditCard,
    CreditLine,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Cash => "CASH",
            AccountType::Bank => "BANK",
            AccountType::Brokerage => "BROKERAGE",
            AccountType::Exchange => "EXCHANGE",
            AccountType::Wallet => "WALLET",
            AccountType::CreditCard => "CREDIT_CARD",
            AccountType::CreditLine => "CREDIT_LINE",
        }
    }

    /// Returns true for accounts that carry a credit balance.
    pub fn is_credit(&self) -> bool {
        matches!(self, AccountType::CreditCard | AccountType::CreditLine)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CASH" => Ok(AccountType::Cash),
            "BANK" => Ok(AccountType::Bank),
            "BROKERAGE" => Ok(AccountType::Brokerage),
            "EXCHANGE" => Ok(AccountType::Exchange),
            "WALLET" => Ok(AccountType::Wallet),
            "CREDIT_CARD" => Ok(AccountType::CreditCard),
            "CREDIT_LINE" => Ok(AccountType::CreditLine),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown account type '{}'",
                other
            )))),
        }
    }
}

/// Domain model representing an account in the system.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: AccountType,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub account_type: AccountType,
    pub currency: String,
    pub is_active: bool,
}

impl NewAccount {
    /// Validates the new account data.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account name cannot be empty".to_string(),
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Currency cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

/// Input model for updating an existing account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub id: Option<String>,
    pub name: String,
    pub account_type: AccountType,
    pub is_active: bool,
}

impl AccountUpdate {
    /// Validates the account update data.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_none() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account ID is required for updates".to_string(),
            )));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account name cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}
