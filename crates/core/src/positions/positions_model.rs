use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DECIMAL_PRECISION, QUANTITY_THRESHOLD};
use crate::errors::{DomainError, Result, ValidationError};
use crate::Error;

pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    let threshold =
        Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 8));
    quantity.abs() >= threshold
}

/// Intended holding period of a lot. Part of the lot key, so the same asset
/// held short- and long-term in one account is two separate lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Horizon {
    Short,
    Medium,
    #[default]
    Long,
}

impl Horizon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Horizon::Short => "SHORT",
            Horizon::Medium => "MEDIUM",
            Horizon::Long => "LONG",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Horizon {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SHORT" => Ok(Horizon::Short),
            "MEDIUM" => Ok(Horizon::Medium),
            "LONG" => Ok(Horizon::Long),
            other => Err(ValidationError::InvalidInput(format!("Unknown horizon '{}'", other)).into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionKey {
    pub asset_id: String,
    pub account_id: String,
    pub horizon: Horizon,
}

impl PositionKey {
    pub fn new(asset_id: impl Into<String>, account_id: impl Into<String>, horizon: Horizon) -> Self {
        Self {
            asset_id: asset_id.into(),
            account_id: account_id.into(),
            horizon,
        }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.account_id, self.asset_id, self.horizon)
    }
}

/// How a transaction moves a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionEffect {
    Deposit,
    Withdrawal,
}

/// Cost basis relieved and P&L realized by one withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalOutcome {
    pub cost_basis: Decimal,
    pub realized_pnl: Decimal,
    pub closed: bool,
}

/// One investment lot per (asset, account, horizon).
///
/// Deposits blend into a weighted-average unit cost. Withdrawals relieve cost
/// basis pro rata and accumulate realized P&L in `pending_realized_pnl`; the
/// headline `realized_pnl` is only set when the lot closes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    #[serde(flatten)]
    pub key: PositionKey,
    pub deposit_quantity: Decimal,
    pub deposit_cost: Decimal,
    pub average_unit_cost: Decimal,
    pub withdrawn_quantity: Decimal,
    pub withdrawn_value: Decimal,
    pub cost_basis_withdrawn: Decimal,
    pub pending_realized_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub pnl_percent: Decimal,
    pub is_open: bool,
    /// Quantity zeroed by a forced close. Already included in `withdrawn_quantity`.
    pub written_off_quantity: Decimal,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Empty open lot; the first deposit gives it a quantity.
    pub fn open(key: PositionKey, at: DateTime<Utc>) -> Self {
        Position {
            id: Uuid::new_v4().to_string(),
            key,
            deposit_quantity: Decimal::ZERO,
            deposit_cost: Decimal::ZERO,
            average_unit_cost: Decimal::ZERO,
            withdrawn_quantity: Decimal::ZERO,
            withdrawn_value: Decimal::ZERO,
            cost_basis_withdrawn: Decimal::ZERO,
            pending_realized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            pnl_percent: Decimal::ZERO,
            is_open: true,
            written_off_quantity: Decimal::ZERO,
            opened_at: at,
            closed_at: None,
            closed_by: None,
            updated_at: at,
        }
    }

    pub fn remaining_quantity(&self) -> Decimal {
        self.deposit_quantity - self.withdrawn_quantity
    }

    /// Cost basis still attached to the remaining quantity.
    pub fn remaining_cost_basis(&self) -> Decimal {
        (self.deposit_cost - self.cost_basis_withdrawn).max(Decimal::ZERO)
    }

    pub fn market_value(&self, price: Decimal) -> Decimal {
        self.remaining_quantity().max(Decimal::ZERO) * price
    }

    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        self.market_value(price) - self.remaining_cost_basis()
    }

    fn ensure_open(&self) -> Result<()> {
        if !self.is_open {
            return Err(DomainError::PositionClosed(self.id.clone()).into());
        }
        Ok(())
    }

    /// Adds `quantity` acquired for a total of `cost`.
    pub fn add_deposit(
        &mut self,
        quantity: Decimal,
        cost: Decimal,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::non_positive("quantity", quantity).into());
        }
        if cost < Decimal::ZERO {
            return Err(ValidationError::negative("cost", cost).into());
        }
        self.ensure_open()?;

        self.deposit_cost += cost;
        self.deposit_quantity += quantity;
        self.average_unit_cost = self.deposit_cost / self.deposit_quantity;
        self.updated_at = at;

        debug!(
            "Position {} deposit {} for {}, average cost now {}",
            self.id,
            quantity,
            cost,
            self.average_unit_cost.round_dp(DECIMAL_PRECISION)
        );
        Ok(())
    }

    /// Removes `quantity` that was sold or moved out for `value`.
    ///
    /// Without `allow_overdraw` the quantity may not exceed what remains.
    /// Reaching a zero remainder closes the lot.
    pub fn add_withdrawal(
        &mut self,
        quantity: Decimal,
        value: Decimal,
        at: DateTime<Utc>,
        allow_overdraw: bool,
    ) -> Result<WithdrawalOutcome> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::NonPositiveWithdrawal(quantity).into());
        }
        if value < Decimal::ZERO {
            return Err(ValidationError::negative("value", value).into());
        }
        self.ensure_open()?;

        let remaining = self.remaining_quantity();
        if quantity > remaining && !allow_overdraw {
            return Err(DomainError::InsufficientQuantity {
                requested: quantity,
                available: remaining,
            }
            .into());
        }

        let cost_basis = self.cost_basis_for(quantity.min(remaining.max(Decimal::ZERO)));
        let realized_pnl = value - cost_basis;

        self.withdrawn_quantity += quantity;
        self.withdrawn_value += value;
        self.cost_basis_withdrawn += cost_basis;
        self.pending_realized_pnl += realized_pnl;
        self.updated_at = at;

        let closed = !is_quantity_significant(&self.remaining_quantity())
            || self.remaining_quantity() < Decimal::ZERO;
        if closed {
            self.finalize(at);
        }

        Ok(WithdrawalOutcome {
            cost_basis,
            realized_pnl,
            closed,
        })
    }

    /// Closes the lot. Unless `force` is set the lot must already be empty;
    /// a forced close writes the remainder off at zero value.
    pub fn close(&mut self, force: bool, at: DateTime<Utc>) -> Result<()> {
        self.ensure_open()?;
        let remaining = self.remaining_quantity();
        if is_quantity_significant(&remaining) && remaining > Decimal::ZERO {
            if !force {
                return Err(DomainError::PositionStillOpen { remaining }.into());
            }
            let written_off_basis = self.remaining_cost_basis();
            self.written_off_quantity += remaining;
            self.withdrawn_quantity += remaining;
            self.cost_basis_withdrawn += written_off_basis;
            self.pending_realized_pnl -= written_off_basis;
        }
        self.finalize(at);
        Ok(())
    }

    fn cost_basis_for(&self, quantity: Decimal) -> Decimal {
        if self.deposit_quantity.is_zero() {
            return Decimal::ZERO;
        }
        (self.deposit_cost * quantity / self.deposit_quantity).min(self.deposit_cost)
    }

    fn finalize(&mut self, at: DateTime<Utc>) {
        self.realized_pnl = self.withdrawn_value - self.deposit_cost;
        self.pnl_percent = if self.deposit_cost.is_zero() {
            Decimal::ZERO
        } else {
            (self.realized_pnl / self.deposit_cost * Decimal::ONE_HUNDRED)
                .round_dp(DECIMAL_PRECISION)
        };
        self.is_open = false;
        self.closed_at = Some(at);
        self.updated_at = at;
        debug!(
            "Position {} closed with realized P&L {} ({}%)",
            self.id, self.realized_pnl, self.pnl_percent
        );
    }
}
