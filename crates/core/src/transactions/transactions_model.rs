//! Transaction domain models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};
use crate::positions::{Horizon, PositionEffect, PositionKey};
use crate::Error;

/// Kind of monetary event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money or units coming in from outside the portfolio.
    Deposit,
    /// Money or units leaving the portfolio.
    Withdraw,
    /// Units arriving from another account. Internal when both legs are tracked.
    TransferIn,
    /// Units leaving for another account. Internal when both legs are tracked.
    TransferOut,
    /// Salary, dividends and other earned income.
    Income,
    /// Spending.
    Expense,
    /// Platform or service fee.
    Fee,
    /// Staking, airdrop or cashback reward.
    Reward,
    /// Money lent to someone else. The receivable stays on the books.
    Lend,
    /// A borrower paying back money we lent.
    Repay,
    /// Us paying back money we borrowed.
    RepayBorrow,
    /// Interest earned.
    Interest,
    /// Interest paid on borrowed money.
    InterestExpense,
    /// Money borrowed. Increases holdings, not income.
    Borrow,
    /// Mark-to-market observation. Moves nothing.
    Valuation,
}

impl TransactionType {
    pub const ALL: [TransactionType; 15] = [
        TransactionType::Deposit,
        TransactionType::Withdraw,
        TransactionType::TransferIn,
        TransactionType::TransferOut,
        TransactionType::Income,
        TransactionType::Expense,
        TransactionType::Fee,
        TransactionType::Reward,
        TransactionType::Lend,
        TransactionType::Repay,
        TransactionType::RepayBorrow,
        TransactionType::Interest,
        TransactionType::InterestExpense,
        TransactionType::Borrow,
        TransactionType::Valuation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdraw => "WITHDRAW",
            TransactionType::TransferIn => "TRANSFER_IN",
            TransactionType::TransferOut => "TRANSFER_OUT",
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
            TransactionType::Fee => "FEE",
            TransactionType::Reward => "REWARD",
            TransactionType::Lend => "LEND",
            TransactionType::Repay => "REPAY",
            TransactionType::RepayBorrow => "REPAY_BORROW",
            TransactionType::Interest => "INTEREST",
            TransactionType::InterestExpense => "INTEREST_EXPENSE",
            TransactionType::Borrow => "BORROW",
            TransactionType::Valuation => "VALUATION",
        }
    }

    /// Sign applied to the quantity: `1`, `-1`, or `0`.
    pub fn quantity_sign(&self) -> Decimal {
        match self {
            TransactionType::Deposit
            | TransactionType::TransferIn
            | TransactionType::Income
            | TransactionType::Reward
            | TransactionType::Lend
            | TransactionType::Repay
            | TransactionType::Interest
            | TransactionType::Borrow => Decimal::ONE,
            TransactionType::Withdraw
            | TransactionType::TransferOut
            | TransactionType::Expense
            | TransactionType::Fee
            | TransactionType::RepayBorrow
            | TransactionType::InterestExpense => Decimal::NEGATIVE_ONE,
            TransactionType::Valuation => Decimal::ZERO,
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            TransactionType::TransferIn | TransactionType::TransferOut
        )
    }

    /// How this type moves an investment lot, if at all.
    ///
    /// Lending and borrowing legs are receivables and liabilities, not
    /// holdings, so they never touch a lot.
    pub fn position_effect(&self) -> Option<PositionEffect> {
        match self {
            TransactionType::Deposit
            | TransactionType::TransferIn
            | TransactionType::Income
            | TransactionType::Reward
            | TransactionType::Interest => Some(PositionEffect::Deposit),
            TransactionType::Withdraw
            | TransactionType::TransferOut
            | TransactionType::Expense
            | TransactionType::Fee => Some(PositionEffect::Withdrawal),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                ValidationError::InvalidInput(format!("Unknown transaction type '{}'", s)).into()
            })
    }
}

/// Exchange rates frozen at the moment a transaction was recorded.
///
/// `rates[c]` converts one unit of `local_currency` into currency `c`.
/// Reports always read the stored snapshot; rates are never fetched again
/// for a saved transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxSnapshot {
    pub local_currency: String,
    pub rates: BTreeMap<String, Decimal>,
    pub captured_at: DateTime<Utc>,
}

impl FxSnapshot {
    pub fn new(local_currency: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            local_currency: local_currency.into(),
            rates: BTreeMap::new(),
            captured_at,
        }
    }

    pub fn with_rate(mut self, currency: impl Into<String>, rate: Decimal) -> Self {
        self.rates.insert(currency.into(), rate);
        self
    }

    /// Rate into `currency`; the local currency is implicitly 1.
    pub fn rate_for(&self, currency: &str) -> Option<Decimal> {
        if currency == self.local_currency {
            return Some(Decimal::ONE);
        }
        self.rates.get(currency).copied()
    }
}

/// Amounts computed from a transaction and stored next to it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFields {
    /// `quantity × unit_price` in the snapshot's local currency.
    pub amount_local: Decimal,
    /// `amount_local` converted into each reporting currency.
    pub amounts: BTreeMap<String, Decimal>,
    /// Signed change in held quantity.
    pub delta_quantity: Decimal,
    /// Signed external cash flow per reporting currency.
    pub cash_flows: BTreeMap<String, Decimal>,
}

/// A recorded monetary event. Immutable once saved; only `derived` is
/// rewritten by the recalculation tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub asset_id: String,
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
    pub quantity: Decimal,
    /// Price per unit in the snapshot's local currency.
    pub unit_price: Decimal,
    pub horizon: Horizon,
    pub fx_snapshot: FxSnapshot,
    /// Set when both legs of a transfer are inside the portfolio.
    pub internal_flow: bool,
    pub allow_overdraw: bool,
    pub notes: Option<String>,
    pub derived: DerivedFields,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn position_key(&self) -> PositionKey {
        PositionKey::new(&self.asset_id, &self.account_id, self.horizon)
    }
}

/// Input model for recording a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub id: Option<String>,
    pub account_id: String,
    pub asset_id: String,
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub horizon: Horizon,
    pub fx_snapshot: FxSnapshot,
    #[serde(default)]
    pub internal_flow: bool,
    #[serde(default)]
    pub allow_overdraw: bool,
    pub notes: Option<String>,
}

/// Result of a recalculation pass over stored transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationSummary {
    pub total: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub failed: Vec<String>,
}
