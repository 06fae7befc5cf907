use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::vault_share::VaultShare;
use super::vaults_model::{
    ManualPricing, Vault, VaultKind, VaultStatus, VaultTransaction, VaultTransactionType,
};
use super::vaults_requests::{
    CreateVaultRequest, DepositRequest, EnableManualPricingRequest, FeeRequest, NewVaultKind,
    RebalanceRequest, UpdateManualPriceRequest, UpdateManualTotalValueRequest, ValuationRequest,
    WithdrawRequest, YieldRequest,
};
use super::vaults_traits::{VaultRepositoryTrait, VaultServiceTrait};
use crate::constants::DEFAULT_INITIAL_SHARE_PRICE;
use crate::errors::{DomainError, Result, ValidationError};
use crate::positions::{Position, PositionKey};

/// What a mutating vault call changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultActionResult {
    pub vault: Vault,
    pub share: Option<VaultShare>,
    pub entries: Vec<VaultTransaction>,
}

pub struct VaultService {
    repository: Arc<dyn VaultRepositoryTrait>,
}

fn require_actor(actor: &str) -> Result<()> {
    if actor.trim().is_empty() {
        return Err(ValidationError::MissingField("actor".to_string()).into());
    }
    Ok(())
}

fn require_user(user_id: Option<&String>) -> Result<&str> {
    user_id
        .map(String::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ValidationError::MissingField("userId".to_string()).into())
}

impl VaultService {
    pub fn new(repository: Arc<dyn VaultRepositoryTrait>) -> Self {
        Self { repository }
    }

    fn load_share(&self, vault_id: &str, user_id: &str, at: DateTime<Utc>) -> Result<VaultShare> {
        Ok(self
            .repository
            .get_share(vault_id, user_id)?
            .unwrap_or_else(|| VaultShare::new(vault_id, user_id, at)))
    }

    async fn commit(
        &self,
        vault: Vault,
        share: Option<VaultShare>,
        entries: Vec<VaultTransaction>,
    ) -> Result<VaultActionResult> {
        self.repository
            .save_vault_mutation(vault.clone(), share.clone(), entries.clone())
            .await?;
        Ok(VaultActionResult {
            vault,
            share,
            entries,
        })
    }

    /// Load, apply `change`, write one ledger entry of `transaction_type`.
    /// `change` returns the entry's amount.
    async fn adjust<F>(
        &self,
        vault_id: &str,
        actor: &str,
        transaction_type: VaultTransactionType,
        notes: Option<String>,
        change: F,
    ) -> Result<VaultActionResult>
    where
        F: FnOnce(&mut Vault, DateTime<Utc>) -> Result<Decimal> + Send,
    {
        require_actor(actor)?;
        let mut vault = self.repository.get_by_id(vault_id)?;
        let before = vault.clone();
        let now = Utc::now();

        let amount = change(&mut vault, now)?;
        let entry = VaultTransaction::between(transaction_type, &before, &vault, actor, now)
            .with_amount(amount)
            .with_notes(notes);

        info!(
            "Vault {} {} by {}: aum {} -> {}, price {} -> {}",
            vault.id,
            transaction_type,
            actor,
            before.aum,
            vault.aum,
            before.current_share_price,
            vault.current_share_price
        );
        self.commit(vault, None, vec![entry]).await
    }
}

#[async_trait]
impl VaultServiceTrait for VaultService {
    async fn create_vault(&self, request: CreateVaultRequest, actor: &str) -> Result<Vault> {
        require_actor(actor)?;
        request.validate()?;

        let now = Utc::now();
        let initial_share_price = match request.initial_share_price {
            Some(price) => price,
            None => Decimal::from_str(DEFAULT_INITIAL_SHARE_PRICE)?,
        };
        let kind = match request.kind {
            NewVaultKind::Tokenized => VaultKind::Tokenized {
                total_shares: Decimal::ZERO,
            },
            NewVaultKind::SimplePosition {
                asset_id,
                account_id,
                horizon,
            } => VaultKind::SimplePosition {
                position: Position::open(PositionKey::new(asset_id, account_id, horizon), now),
            },
        };

        let vault = Vault {
            id: Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            currency: request.currency.trim().to_uppercase(),
            kind,
            aum: Decimal::ZERO,
            current_share_price: initial_share_price,
            initial_share_price,
            manual_pricing: ManualPricing::default(),
            status: VaultStatus::Active,
            created_at: now,
            updated_at: now,
        };
        info!(
            "Creating {} vault '{}' for {}",
            vault.kind.name(),
            vault.name,
            actor
        );
        self.repository.create(vault).await
    }

    fn get_vault(&self, vault_id: &str) -> Result<Vault> {
        self.repository.get_by_id(vault_id)
    }

    fn list_vaults(&self) -> Result<Vec<Vault>> {
        self.repository.list()
    }

    async fn deposit(
        &self,
        vault_id: &str,
        request: DepositRequest,
        actor: &str,
    ) -> Result<VaultActionResult> {
        require_actor(actor)?;
        request.validate()?;
        let mut vault = self.repository.get_by_id(vault_id)?;
        let before = vault.clone();
        let now = Utc::now();

        let user_id = match vault.kind {
            VaultKind::Tokenized { .. } => Some(require_user(request.user_id.as_ref())?),
            VaultKind::SimplePosition { .. } => None,
        };

        let movement = vault.deposit(request.amount, now)?;
        let deposit = VaultTransaction::between(
            VaultTransactionType::Deposit,
            &before,
            &vault,
            actor,
            now,
        )
        .with_amount(movement.amount)
        .with_notes(request.notes.clone());

        let (share, entries) = match user_id {
            Some(user_id) => {
                let mut share = self.load_share(vault_id, user_id, now)?;
                let shares_before = share.share_balance;
                share.mint_shares(movement.shares, movement.amount, now)?;
                let mint = VaultTransaction::between(
                    VaultTransactionType::MintShares,
                    &before,
                    &vault,
                    actor,
                    now,
                )
                .with_shares(movement.shares, movement.price)
                .with_user(user_id, shares_before, share.share_balance);
                let deposit = deposit.with_user(user_id, shares_before, share.share_balance);
                (Some(share), vec![deposit, mint])
            }
            None => (
                None,
                vec![deposit.with_shares(movement.shares, movement.price)],
            ),
        };

        info!(
            "Vault {} deposit of {} by {} minted {} shares at {}",
            vault.id, movement.amount, actor, movement.shares, movement.price
        );
        self.commit(vault, share, entries).await
    }

    async fn withdraw(
        &self,
        vault_id: &str,
        request: WithdrawRequest,
        actor: &str,
    ) -> Result<VaultActionResult> {
        require_actor(actor)?;
        request.validate()?;
        let mut vault = self.repository.get_by_id(vault_id)?;
        let before = vault.clone();
        let now = Utc::now();

        let mut share = match vault.kind {
            VaultKind::Tokenized { .. } => {
                let user_id = require_user(request.user_id.as_ref())?;
                Some(self.load_share(vault_id, user_id, now)?)
            }
            VaultKind::SimplePosition { .. } => None,
        };

        // Check the holder's balance before the vault moves
        if let (Some(share), Some(shares)) = (&share, request.shares) {
            if shares > share.share_balance {
                return Err(DomainError::InsufficientShares {
                    requested: shares,
                    available: share.share_balance,
                }
                .into());
            }
        }

        let movement = match (request.shares, request.amount) {
            (Some(shares), _) => vault.withdraw_shares(shares, now)?,
            (None, Some(amount)) => vault.withdraw_amount(amount, now)?,
            (None, None) => {
                return Err(ValidationError::MissingField("shares".to_string()).into())
            }
        };

        let withdrawal = VaultTransaction::between(
            VaultTransactionType::Withdrawal,
            &before,
            &vault,
            actor,
            now,
        )
        .with_amount(movement.amount)
        .with_notes(request.notes.clone());

        let entries = match share.as_mut() {
            Some(share) => {
                let shares_before = share.share_balance;
                let realized = share.burn_shares(movement.shares, movement.amount, now)?;
                debug!(
                    "User {} realized {} on vault {}",
                    share.user_id, realized, vault.id
                );
                let burn = VaultTransaction::between(
                    VaultTransactionType::BurnShares,
                    &before,
                    &vault,
                    actor,
                    now,
                )
                .with_shares(movement.shares, movement.price)
                .with_user(&share.user_id, shares_before, share.share_balance);
                let withdrawal =
                    withdrawal.with_user(&share.user_id, shares_before, share.share_balance);
                vec![withdrawal, burn]
            }
            None => vec![withdrawal.with_shares(movement.shares, movement.price)],
        };

        info!(
            "Vault {} withdrawal of {} by {} burned {} shares at {}",
            vault.id, movement.amount, actor, movement.shares, movement.price
        );
        self.commit(vault, share, entries).await
    }

    async fn record_yield(
        &self,
        vault_id: &str,
        request: YieldRequest,
        actor: &str,
    ) -> Result<VaultActionResult> {
        request.validate()?;
        let amount = request.amount;
        self.adjust(
            vault_id,
            actor,
            VaultTransactionType::Yield,
            request.notes,
            move |vault, at| vault.record_yield(amount, at).map(|_| amount),
        )
        .await
    }

    async fn record_fee(
        &self,
        vault_id: &str,
        request: FeeRequest,
        actor: &str,
    ) -> Result<VaultActionResult> {
        request.validate()?;
        let amount = request.amount;
        self.adjust(
            vault_id,
            actor,
            VaultTransactionType::Fee,
            request.notes,
            move |vault, at| vault.record_fee(amount, at).map(|_| amount),
        )
        .await
    }

    async fn record_valuation(
        &self,
        vault_id: &str,
        request: ValuationRequest,
        actor: &str,
    ) -> Result<VaultActionResult> {
        request.validate()?;
        let aum = request.aum;
        self.adjust(
            vault_id,
            actor,
            VaultTransactionType::Valuation,
            request.notes,
            move |vault, at| vault.record_valuation(aum, at).map(|_| aum),
        )
        .await
    }

    async fn record_rebalance(
        &self,
        vault_id: &str,
        request: RebalanceRequest,
        actor: &str,
    ) -> Result<VaultActionResult> {
        request.validate()?;
        let amount = request.amount;
        self.adjust(
            vault_id,
            actor,
            VaultTransactionType::Rebalance,
            request.notes,
            move |vault, at| vault.record_rebalance(amount, at).map(|_| amount),
        )
        .await
    }

    async fn enable_manual_pricing(
        &self,
        vault_id: &str,
        request: EnableManualPricingRequest,
        actor: &str,
    ) -> Result<VaultActionResult> {
        request.validate()?;
        let actor_name = actor.to_string();
        let notes = request.notes.clone();
        self.adjust(
            vault_id,
            actor,
            VaultTransactionType::ManualPriceUpdate,
            request.notes,
            move |vault, at| {
                vault
                    .enable_manual_pricing(request.initial_price, &actor_name, notes, at)
                    .map(|_| Decimal::ZERO)
            },
        )
        .await
    }

    async fn update_manual_price(
        &self,
        vault_id: &str,
        request: UpdateManualPriceRequest,
        actor: &str,
    ) -> Result<VaultActionResult> {
        request.validate()?;
        let actor_name = actor.to_string();
        let notes = request.notes.clone();
        self.adjust(
            vault_id,
            actor,
            VaultTransactionType::ManualPriceUpdate,
            request.notes,
            move |vault, at| {
                vault
                    .update_manual_price(request.new_price, &actor_name, notes, at)
                    .map(|_| Decimal::ZERO)
            },
        )
        .await
    }

    async fn update_manual_total_value(
        &self,
        vault_id: &str,
        request: UpdateManualTotalValueRequest,
        actor: &str,
    ) -> Result<VaultActionResult> {
        request.validate()?;
        let actor_name = actor.to_string();
        let notes = request.notes.clone();
        self.adjust(
            vault_id,
            actor,
            VaultTransactionType::ManualPriceUpdate,
            request.notes,
            move |vault, at| {
                vault
                    .update_manual_total_value(
                        request.new_total_value,
                        request.net_contribution_delta,
                        &actor_name,
                        notes,
                        at,
                    )
                    .map(|_| request.new_total_value)
            },
        )
        .await
    }

    async fn disable_manual_pricing(
        &self,
        vault_id: &str,
        actor: &str,
    ) -> Result<VaultActionResult> {
        let actor_name = actor.to_string();
        self.adjust(
            vault_id,
            actor,
            VaultTransactionType::ManualPriceUpdate,
            Some("manual pricing disabled".to_string()),
            move |vault, at| {
                vault
                    .disable_manual_pricing(&actor_name, at)
                    .map(|_| Decimal::ZERO)
            },
        )
        .await
    }

    async fn close_vault(&self, vault_id: &str, actor: &str) -> Result<Vault> {
        require_actor(actor)?;
        let mut vault = self.repository.get_by_id(vault_id)?;
        vault.close(Utc::now())?;
        info!("Vault {} closed by {}", vault.id, actor);
        self.repository
            .save_vault_mutation(vault.clone(), None, Vec::new())
            .await?;
        Ok(vault)
    }

    fn get_vault_transactions(&self, vault_id: &str) -> Result<Vec<VaultTransaction>> {
        self.repository.list_transactions(vault_id)
    }

    fn get_user_share(&self, vault_id: &str, user_id: &str) -> Result<Option<VaultShare>> {
        self.repository.get_share(vault_id, user_id)
    }
}
