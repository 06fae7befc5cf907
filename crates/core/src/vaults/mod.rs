//! Vaults module - pooled investments priced per share.
//!
//! A vault is either tokenized (shares minted to users) or a wrapper around a
//! single investment lot. Both expose the same pricing interface over
//! [`Vault::supply`].

mod share_pricing;
mod vault_share;
mod vaults_model;
mod vaults_requests;
mod vaults_service;
mod vaults_traits;


pub use share_pricing::ShareMovement;
pub use vault_share::VaultShare;
pub use vaults_model::{
    ManualPricing, Vault, VaultKind, VaultStatus, VaultTransaction, VaultTransactionType,
};
pub use vaults_requests::{
    CreateVaultRequest, DepositRequest, EnableManualPricingRequest, FeeRequest, NewVaultKind,
    RebalanceRequest, UpdateManualPriceRequest, UpdateManualTotalValueRequest, ValuationRequest,
    WithdrawRequest, YieldRequest,
};
pub use vaults_service::{VaultActionResult, VaultService};
pub use vaults_traits::{VaultRepositoryTrait, VaultServiceTrait};
