use async_trait::async_trait;

use super::vault_share::VaultShare;
use super::vaults_model::{Vault, VaultTransaction};
use super::vaults_requests::{
    CreateVaultRequest, DepositRequest, EnableManualPricingRequest, FeeRequest, RebalanceRequest,
    UpdateManualPriceRequest, UpdateManualTotalValueRequest, ValuationRequest, WithdrawRequest,
    YieldRequest,
};
use super::vaults_service::VaultActionResult;
use crate::errors::Result;

/// Persistence contract for vaults, user shares and the vault ledger.
#[async_trait]
pub trait VaultRepositoryTrait: Send + Sync {
    fn get_by_id(&self, vault_id: &str) -> Result<Vault>;

    fn list(&self) -> Result<Vec<Vault>>;

    async fn create(&self, vault: Vault) -> Result<Vault>;

    /// Saves the vault, the touched user share and the ledger entries in one
    /// transaction. Either all of them land or none do.
    async fn save_vault_mutation(
        &self,
        vault: Vault,
        share: Option<VaultShare>,
        entries: Vec<VaultTransaction>,
    ) -> Result<()>;

    fn get_share(&self, vault_id: &str, user_id: &str) -> Result<Option<VaultShare>>;

    /// Ledger entries oldest first.
    fn list_transactions(&self, vault_id: &str) -> Result<Vec<VaultTransaction>>;
}

/// Vault operations. Every mutating call names the acting user.
#[async_trait]
pub trait VaultServiceTrait: Send + Sync {
    async fn create_vault(&self, request: CreateVaultRequest, actor: &str) -> Result<Vault>;

    fn get_vault(&self, vault_id: &str) -> Result<Vault>;

    fn list_vaults(&self) -> Result<Vec<Vault>>;

    async fn deposit(
        &self,
        vault_id: &str,
        request: DepositRequest,
        actor: &str,
    ) -> Result<VaultActionResult>;

    async fn withdraw(
        &self,
        vault_id: &str,
        request: WithdrawRequest,
        actor: &str,
    ) -> Result<VaultActionResult>;

    async fn record_yield(
        &self,
        vault_id: &str,
        request: YieldRequest,
        actor: &str,
    ) -> Result<VaultActionResult>;

    async fn record_fee(
        &self,
        vault_id: &str,
        request: FeeRequest,
        actor: &str,
    ) -> Result<VaultActionResult>;

    async fn record_valuation(
        &self,
        vault_id: &str,
        request: ValuationRequest,
        actor: &str,
    ) -> Result<VaultActionResult>;

    async fn record_rebalance(
        &self,
        vault_id: &str,
        request: RebalanceRequest,
        actor: &str,
    ) -> Result<VaultActionResult>;

    async fn enable_manual_pricing(
        &self,
        vault_id: &str,
        request: EnableManualPricingRequest,
        actor: &str,
    ) -> Result<VaultActionResult>;

    async fn update_manual_price(
        &self,
        vault_id: &str,
        request: UpdateManualPriceRequest,
        actor: &str,
    ) -> Result<VaultActionResult>;

    async fn update_manual_total_value(
        &self,
        vault_id: &str,
        request: UpdateManualTotalValueRequest,
        actor: &str,
    ) -> Result<VaultActionResult>;

    async fn disable_manual_pricing(&self, vault_id: &str, actor: &str)
        -> Result<VaultActionResult>;

    async fn close_vault(&self, vault_id: &str, actor: &str) -> Result<Vault>;

    fn get_vault_transactions(&self, vault_id: &str) -> Result<Vec<VaultTransaction>>;

    fn get_user_share(&self, vault_id: &str, user_id: &str) -> Result<Option<VaultShare>>;
}
