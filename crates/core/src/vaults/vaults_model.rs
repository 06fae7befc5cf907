//! Vault domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, ValidationError};
use crate::positions::Position;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaultStatus {
    #[default]
    Active,
    Closed,
}

impl VaultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VaultStatus::Active => "ACTIVE",
            VaultStatus::Closed => "CLOSED",
        }
    }
}

impl FromStr for VaultStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(VaultStatus::Active),
            "CLOSED" => Ok(VaultStatus::Closed),
            other => {
                Err(ValidationError::InvalidInput(format!("Unknown vault status '{}'", other))
                    .into())
            }
        }
    }
}

/// What the vault's shares represent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaultKind {
    /// Shares are minted to and burned from individual users.
    #[serde(rename_all = "camelCase")]
    Tokenized { total_shares: Decimal },
    /// The vault wraps one investment lot; its units are the shares.
    #[serde(rename_all = "camelCase")]
    SimplePosition { position: Position },
}

impl VaultKind {
    pub fn name(&self) -> &'static str {
        match self {
            VaultKind::Tokenized { .. } => "TOKENIZED",
            VaultKind::SimplePosition { .. } => "SIMPLE_POSITION",
        }
    }
}

/// Manual-pricing sub-state.
///
/// `reference_aum` is the total value the next relative-growth update is
/// measured against. It is `None` until the first total-value update seeds it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualPricing {
    pub is_manual_price: bool,
    pub manual_price_per_share: Option<Decimal>,
    pub reference_aum: Option<Decimal>,
    pub reference_price: Option<Decimal>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub kind: VaultKind,
    pub aum: Decimal,
    pub current_share_price: Decimal,
    pub initial_share_price: Decimal,
    pub manual_pricing: ManualPricing,
    pub status: VaultStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaultTransactionType {
    Deposit,
    Withdrawal,
    MintShares,
    BurnShares,
    Fee,
    Yield,
    Valuation,
    Rebalance,
    ManualPriceUpdate,
}

impl VaultTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VaultTransactionType::Deposit => "DEPOSIT",
            VaultTransactionType::Withdrawal => "WITHDRAWAL",
            VaultTransactionType::MintShares => "MINT_SHARES",
            VaultTransactionType::BurnShares => "BURN_SHARES",
            VaultTransactionType::Fee => "FEE",
            VaultTransactionType::Yield => "YIELD",
            VaultTransactionType::Valuation => "VALUATION",
            VaultTransactionType::Rebalance => "REBALANCE",
            VaultTransactionType::ManualPriceUpdate => "MANUAL_PRICE_UPDATE",
        }
    }
}

impl fmt::Display for VaultTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaultTransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DEPOSIT" => Ok(VaultTransactionType::Deposit),
            "WITHDRAWAL" => Ok(VaultTransactionType::Withdrawal),
            "MINT_SHARES" => Ok(VaultTransactionType::MintShares),
            "BURN_SHARES" => Ok(VaultTransactionType::BurnShares),
            "FEE" => Ok(VaultTransactionType::Fee),
            "YIELD" => Ok(VaultTransactionType::Yield),
            "VALUATION" => Ok(VaultTransactionType::Valuation),
            "REBALANCE" => Ok(VaultTransactionType::Rebalance),
            "MANUAL_PRICE_UPDATE" => Ok(VaultTransactionType::ManualPriceUpdate),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown vault transaction type '{}'",
                other
            ))
            .into()),
        }
    }
}

/// Append-only ledger entry with the vault state on both sides of the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultTransaction {
    pub id: String,
    pub vault_id: String,
    pub user_id: Option<String>,
    pub transaction_type: VaultTransactionType,
    pub amount: Decimal,
    pub shares: Decimal,
    pub price_per_share: Decimal,
    pub aum_before: Decimal,
    pub aum_after: Decimal,
    pub share_price_before: Decimal,
    pub share_price_after: Decimal,
    pub user_shares_before: Option<Decimal>,
    pub user_shares_after: Option<Decimal>,
    pub actor: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VaultTransaction {
    /// Entry describing the move from `before` to `after`.
    pub fn between(
        transaction_type: VaultTransactionType,
        before: &Vault,
        after: &Vault,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vault_id: after.id.clone(),
            user_id: None,
            transaction_type,
            amount: Decimal::ZERO,
            shares: Decimal::ZERO,
            price_per_share: after.current_share_price,
            aum_before: before.aum,
            aum_after: after.aum,
            share_price_before: before.current_share_price,
            share_price_after: after.current_share_price,
            user_shares_before: None,
            user_shares_after: None,
            actor: actor.to_string(),
            notes: None,
            created_at: at,
        }
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_shares(mut self, shares: Decimal, price_per_share: Decimal) -> Self {
        self.shares = shares;
        self.price_per_share = price_per_share;
        self
    }

    pub fn with_user(
        mut self,
        user_id: &str,
        shares_before: Decimal,
        shares_after: Decimal,
    ) -> Self {
        self.user_id = Some(user_id.to_string());
        self.user_shares_before = Some(shares_before);
        self.user_shares_after = Some(shares_after);
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}
