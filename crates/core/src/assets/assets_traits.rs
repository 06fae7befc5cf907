use async_trait::async_trait;

use super::assets_model::{Asset, NewAsset};
use crate::errors::Result;

/// Trait defining the contract for Asset repository operations.
#[async_trait]
pub trait AssetRepositoryTrait: Send + Sync {
    async fn create(&self, new_asset: NewAsset) -> Result<Asset>;
    fn get_by_id(&self, asset_id: &str) -> Result<Asset>;
    fn list(&self) -> Result<Vec<Asset>>;
    async fn delete(&self, asset_id: &str) -> Result<()>;
}

/// Trait defining the contract for Asset service operations.
#[async_trait]
pub trait AssetServiceTrait: Send + Sync {
    fn get_assets(&self) -> Result<Vec<Asset>>;
    fn get_asset_by_id(&self, asset_id: &str) -> Result<Asset>;
    async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset>;
    /// Ensures a cash asset exists for the currency. Idempotent.
    async fn ensure_cash_asset(&self, currency: &str) -> Result<Asset>;
    async fn delete_asset(&self, asset_id: &str) -> Result<()>;
}
