use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::SHARE_PRECISION;
use crate::errors::{DomainError, Result, ValidationError};

/// A user's holding in a tokenized vault.
///
/// Cost is tracked as a weighted average per share and does not depend on the
/// vault's pricing mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultShare {
    pub id: String,
    pub vault_id: String,
    pub user_id: String,
    pub share_balance: Decimal,
    pub total_cost: Decimal,
    pub average_cost_per_share: Decimal,
    pub realized_pnl: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl VaultShare {
    pub fn new(vault_id: &str, user_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vault_id: vault_id.to_string(),
            user_id: user_id.to_string(),
            share_balance: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            average_cost_per_share: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            updated_at: at,
        }
    }

    pub fn mint_shares(&mut self, shares: Decimal, cost: Decimal, at: DateTime<Utc>) -> Result<()> {
        if shares <= Decimal::ZERO {
            return Err(ValidationError::non_positive("shares", shares).into());
        }
        if cost < Decimal::ZERO {
            return Err(ValidationError::negative("cost", cost).into());
        }
        self.share_balance += shares;
        self.total_cost += cost;
        self.average_cost_per_share =
            (self.total_cost / self.share_balance).round_dp(SHARE_PRECISION);
        self.updated_at = at;
        Ok(())
    }

    /// Burns shares for `proceeds` and returns the P&L realized by the burn.
    pub fn burn_shares(
        &mut self,
        shares: Decimal,
        proceeds: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Decimal> {
        if shares <= Decimal::ZERO {
            return Err(ValidationError::non_positive("shares", shares).into());
        }
        if proceeds < Decimal::ZERO {
            return Err(ValidationError::negative("proceeds", proceeds).into());
        }
        if shares > self.share_balance {
            return Err(DomainError::InsufficientShares {
                requested: shares,
                available: self.share_balance,
            }
            .into());
        }

        let cost_out = if shares == self.share_balance {
            self.total_cost
        } else {
            self.average_cost_per_share * shares
        };
        let realized = proceeds - cost_out;

        self.share_balance -= shares;
        self.total_cost = (self.total_cost - cost_out).max(Decimal::ZERO);
        if self.share_balance.is_zero() {
            self.total_cost = Decimal::ZERO;
            self.average_cost_per_share = Decimal::ZERO;
        }
        self.realized_pnl += realized;
        self.updated_at = at;
        Ok(realized)
    }

    pub fn market_value(&self, share_price: Decimal) -> Decimal {
        self.share_balance * share_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rust_decimal_macros::dec;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_717_200_000, 0).unwrap()
    }

    #[test]
    fn test_mint_keeps_weighted_average() {
        let mut share = VaultShare::new("v1", "u1", at());
        share.mint_shares(dec!(100), dec!(100), at()).unwrap();
        share.mint_shares(dec!(50), dec!(100), at()).unwrap();

        assert_eq!(share.share_balance, dec!(150));
        assert_eq!(share.total_cost, dec!(200));
        assert_eq!(share.average_cost_per_share, dec!(1.3333333333));
    }

    #[test]
    fn test_burn_realizes_against_average_cost() {
        let mut share = VaultShare::new("v1", "u1", at());
        share.mint_shares(dec!(100), dec!(100), at()).unwrap();

        let realized = share.burn_shares(dec!(40), dec!(60), at()).unwrap();
        assert_eq!(realized, dec!(20));
        assert_eq!(share.share_balance, dec!(60));
        assert_eq!(share.total_cost, dec!(60));
        assert_eq!(share.average_cost_per_share, dec!(1));

        let realized = share.burn_shares(dec!(60), dec!(30), at()).unwrap();
        assert_eq!(realized, dec!(-30));
        assert_eq!(share.total_cost, Decimal::ZERO);
        assert_eq!(share.realized_pnl, dec!(-10));
    }

    #[test]
    fn test_burn_more_than_balance_is_rejected() {
        let mut share = VaultShare::new("v1", "u1", at());
        share.mint_shares(dec!(1), dec!(1), at()).unwrap();
        let before = share.clone();

        let err = share.burn_shares(dec!(2), dec!(2), at()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert_eq!(share, before);
    }
}
