//! Share pricing for vaults.
//!
//! Market mode derives the share price from AUM and supply. Manual mode lets
//! an administrator declare the price, either directly or as a total value
//! that is turned into a price by relative growth:
//!
//! ```text
//! adjusted_reference = reference_aum + net_contribution_delta
//! new_price          = prior_price × new_total / adjusted_reference
//! ```
//!
//! so money moving in or out never reads as a gain or a loss. The first
//! total-value update only seeds `reference_aum`.
//!
//! Every method checks its inputs before touching the vault; on error the
//! vault is unchanged.

use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;

use super::vaults_model::{Vault, VaultKind, VaultStatus};
use crate::constants::SHARE_PRECISION;
use crate::errors::{DomainError, Result, ValidationError};
use crate::positions::Position;

/// Shares minted or burned by one deposit or withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareMovement {
    pub shares: Decimal,
    pub amount: Decimal,
    pub price: Decimal,
}

impl Vault {
    /// Shares outstanding: minted shares for tokenized vaults, remaining
    /// lot quantity for simple-position vaults.
    pub fn supply(&self) -> Decimal {
        match &self.kind {
            VaultKind::Tokenized { total_shares } => *total_shares,
            VaultKind::SimplePosition { position } => {
                position.remaining_quantity().max(Decimal::ZERO)
            }
        }
    }

    pub fn is_manual(&self) -> bool {
        self.manual_pricing.is_manual_price
    }

    /// Price used for the next mint or burn.
    pub fn share_price(&self) -> Decimal {
        if self.is_manual() {
            return self
                .manual_pricing
                .manual_price_per_share
                .unwrap_or(self.current_share_price);
        }
        self.market_price()
    }

    fn market_price(&self) -> Decimal {
        let supply = self.supply();
        if supply.is_zero() {
            self.initial_share_price
        } else {
            (self.aum / supply).round_dp(SHARE_PRECISION)
        }
    }

    /// Re-derives price (market mode) or AUM (manual mode) after supply or
    /// AUM changed.
    fn reprice(&mut self) {
        if self.is_manual() {
            let price = self.share_price();
            self.aum = self.supply() * price;
            self.current_share_price = price;
        } else {
            self.current_share_price = self.market_price();
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.status == VaultStatus::Closed {
            return Err(DomainError::VaultClosed(self.id.clone()).into());
        }
        Ok(())
    }

    fn ensure_manual(&self) -> Result<()> {
        if !self.is_manual() {
            return Err(DomainError::ManualPricingNotEnabled(self.id.clone()).into());
        }
        Ok(())
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    /// Mints shares for `amount` at the current share price.
    pub fn deposit(&mut self, amount: Decimal, at: DateTime<Utc>) -> Result<ShareMovement> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::non_positive("amount", amount).into());
        }
        self.ensure_active()?;
        let price = self.share_price();
        if price <= Decimal::ZERO {
            return Err(DomainError::InvalidManualPrice(price).into());
        }
        let shares = (amount / price).round_dp(SHARE_PRECISION);

        match &mut self.kind {
            VaultKind::Tokenized { total_shares } => *total_shares += shares,
            VaultKind::SimplePosition { position } => position.add_deposit(shares, amount, at)?,
        }
        self.aum += amount;
        self.reprice();
        self.touch(at);

        debug!(
            "Vault {} minted {} shares at {} for {}",
            self.id, shares, price, amount
        );
        Ok(ShareMovement {
            shares,
            amount,
            price,
        })
    }

    /// Burns `shares` and pays out `shares × share price`.
    pub fn withdraw_shares(&mut self, shares: Decimal, at: DateTime<Utc>) -> Result<ShareMovement> {
        if shares <= Decimal::ZERO {
            return Err(ValidationError::non_positive("shares", shares).into());
        }
        self.ensure_active()?;
        let supply = self.supply();
        if shares > supply {
            return Err(DomainError::InsufficientShares {
                requested: shares,
                available: supply,
            }
            .into());
        }
        let price = self.share_price();
        // The last shares out take whatever is left so no AUM dust remains
        let amount = if shares == supply {
            self.aum
        } else {
            (shares * price).min(self.aum)
        };
        if amount < Decimal::ZERO {
            return Err(DomainError::InsufficientAum {
                requested: shares * price,
                available: self.aum,
            }
            .into());
        }

        match &mut self.kind {
            VaultKind::Tokenized { total_shares } => *total_shares -= shares,
            VaultKind::SimplePosition { position } => {
                position.add_withdrawal(shares, amount, at, false)?;
            }
        }
        self.aum -= amount;
        self.reprice();
        self.touch(at);

        debug!(
            "Vault {} burned {} shares at {} for {}",
            self.id, shares, price, amount
        );
        Ok(ShareMovement {
            shares,
            amount,
            price,
        })
    }

    /// Burns the shares worth `amount` at the current price.
    pub fn withdraw_amount(&mut self, amount: Decimal, at: DateTime<Utc>) -> Result<ShareMovement> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::non_positive("amount", amount).into());
        }
        self.ensure_active()?;
        if amount > self.aum {
            return Err(DomainError::InsufficientAum {
                requested: amount,
                available: self.aum,
            }
            .into());
        }
        let price = self.share_price();
        if price <= Decimal::ZERO {
            return Err(DomainError::InvalidManualPrice(price).into());
        }
        let shares = (amount / price).round_dp(SHARE_PRECISION).min(self.supply());
        self.withdraw_shares(shares, at)
    }

    /// Income earned by the vault's holdings.
    pub fn record_yield(&mut self, amount: Decimal, at: DateTime<Utc>) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::non_positive("amount", amount).into());
        }
        self.ensure_active()?;
        self.aum += amount;
        self.apply_aum_change();
        self.touch(at);
        Ok(())
    }

    /// Fee charged against the vault.
    pub fn record_fee(&mut self, amount: Decimal, at: DateTime<Utc>) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::non_positive("amount", amount).into());
        }
        self.ensure_active()?;
        if amount > self.aum {
            return Err(DomainError::InsufficientAum {
                requested: amount,
                available: self.aum,
            }
            .into());
        }
        self.aum -= amount;
        self.apply_aum_change();
        self.touch(at);
        Ok(())
    }

    /// Marks the vault to a new AUM.
    pub fn record_valuation(&mut self, aum: Decimal, at: DateTime<Utc>) -> Result<()> {
        if aum < Decimal::ZERO {
            return Err(ValidationError::negative("aum", aum).into());
        }
        self.ensure_active()?;
        self.aum = aum;
        self.apply_aum_change();
        self.touch(at);
        Ok(())
    }

    /// Turnover inside the vault. Only the timestamp moves.
    pub fn record_rebalance(&mut self, amount: Decimal, at: DateTime<Utc>) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::non_positive("amount", amount).into());
        }
        self.ensure_active()?;
        self.touch(at);
        Ok(())
    }

    /// In manual mode the declared price stands; only AUM moves.
    fn apply_aum_change(&mut self) {
        if !self.is_manual() {
            self.current_share_price = self.market_price();
        }
    }

    pub fn enable_manual_pricing(
        &mut self,
        initial_price: Decimal,
        actor: &str,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if initial_price <= Decimal::ZERO {
            return Err(DomainError::InvalidManualPrice(initial_price).into());
        }
        self.ensure_active()?;
        if self.is_manual() {
            return Err(DomainError::ManualPricingAlreadyEnabled(self.id.clone()).into());
        }

        let mp = &mut self.manual_pricing;
        mp.is_manual_price = true;
        mp.manual_price_per_share = Some(initial_price);
        mp.reference_aum = None;
        mp.reference_price = None;
        mp.updated_by = Some(actor.to_string());
        mp.updated_at = Some(at);
        mp.notes = notes;
        self.reprice();
        self.touch(at);
        Ok(())
    }

    pub fn update_manual_price(
        &mut self,
        new_price: Decimal,
        actor: &str,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if new_price < Decimal::ZERO {
            return Err(DomainError::InvalidManualPrice(new_price).into());
        }
        self.ensure_active()?;
        self.ensure_manual()?;

        self.manual_pricing.manual_price_per_share = Some(new_price);
        self.reprice();

        let aum = self.aum;
        let mp = &mut self.manual_pricing;
        mp.reference_price = Some(new_price);
        // A zero AUM cannot anchor relative growth; the next total-value
        // update re-seeds the baseline instead
        mp.reference_aum = if aum > Decimal::ZERO { Some(aum) } else { None };
        mp.updated_by = Some(actor.to_string());
        mp.updated_at = Some(at);
        mp.notes = notes;
        self.touch(at);
        Ok(())
    }

    /// Declares the vault's total value and derives the new price by relative
    /// growth against the capital-adjusted reference AUM.
    pub fn update_manual_total_value(
        &mut self,
        new_total_value: Decimal,
        net_contribution_delta: Decimal,
        actor: &str,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if new_total_value <= Decimal::ZERO {
            return Err(DomainError::InvalidTotalValue(new_total_value).into());
        }
        self.ensure_active()?;
        self.ensure_manual()?;

        let prior_price = self.share_price();
        let new_price = match self.manual_pricing.reference_aum {
            // Seeding keeps the current price; a zeroed one restarts at the
            // initial share price
            None if prior_price > Decimal::ZERO => prior_price,
            None => self.initial_share_price,
            Some(reference_aum) => {
                let adjusted = reference_aum + net_contribution_delta;
                if adjusted <= Decimal::ZERO {
                    return Err(DomainError::InvalidReferenceValue(adjusted).into());
                }
                let growth = new_total_value / adjusted;
                (prior_price * growth).round_dp(SHARE_PRECISION)
            }
        };

        debug!(
            "Vault {} total value {} (delta {}): price {} -> {}",
            self.id, new_total_value, net_contribution_delta, prior_price, new_price
        );

        let mp = &mut self.manual_pricing;
        mp.manual_price_per_share = Some(new_price);
        mp.reference_aum = Some(new_total_value);
        mp.reference_price = Some(new_price);
        mp.updated_by = Some(actor.to_string());
        mp.updated_at = Some(at);
        mp.notes = notes;
        self.current_share_price = new_price;
        self.aum = new_total_value;
        self.touch(at);
        Ok(())
    }

    pub fn disable_manual_pricing(&mut self, actor: &str, at: DateTime<Utc>) -> Result<()> {
        self.ensure_manual()?;
        self.manual_pricing = super::vaults_model::ManualPricing {
            updated_by: Some(actor.to_string()),
            updated_at: Some(at),
            ..Default::default()
        };
        self.current_share_price = self.market_price();
        self.touch(at);
        Ok(())
    }

    /// Closes an empty vault.
    pub fn close(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.ensure_active()?;
        let supply = self.supply();
        if !supply.is_zero() {
            return Err(DomainError::VaultNotEmpty { supply }.into());
        }
        if let VaultKind::SimplePosition { position } = &mut self.kind {
            if position.is_open {
                position.close(false, at)?;
            }
        }
        self.status = VaultStatus::Closed;
        self.touch(at);
        Ok(())
    }

    /// The embedded lot of a simple-position vault.
    pub fn position(&self) -> Option<&Position> {
        match &self.kind {
            VaultKind::SimplePosition { position } => Some(position),
            VaultKind::Tokenized { .. } => None,
        }
    }
}
