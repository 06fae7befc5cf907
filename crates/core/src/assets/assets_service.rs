use log::{debug, info};
use std::sync::Arc;

use super::assets_model::{Asset, NewAsset};
use super::assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
use crate::errors::Result;

pub struct AssetService {
    repository: Arc<dyn AssetRepositoryTrait>,
}

impl AssetService {
    pub fn new(repository: Arc<dyn AssetRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl AssetServiceTrait for AssetService {
    fn get_assets(&self) -> Result<Vec<Asset>> {
        self.repository.list()
    }

    fn get_asset_by_id(&self, asset_id: &str) -> Result<Asset> {
        self.repository.get_by_id(asset_id)
    }

    async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset> {
        new_asset.validate()?;
        debug!("Creating asset {} ({})", new_asset.symbol, new_asset.kind);
        self.repository.create(new_asset).await
    }

    async fn ensure_cash_asset(&self, currency: &str) -> Result<Asset> {
        let new_asset = NewAsset::new_cash_asset(currency);
        new_asset.validate()?;
        let code = new_asset.symbol.clone();
        match self.repository.get_by_id(&code) {
            Ok(existing) => Ok(existing),
            Err(e) if e.is_not_found() => {
                info!("Creating cash asset for {}", code);
                self.repository.create(new_asset).await
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<()> {
        self.repository.delete(asset_id).await
    }
}
