use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::valuation_model::{
    AccountValuation, HoldingValuation, VaultValuation, CASH_PRICE_SOURCE,
};
use super::valuation_traits::ValuationServiceTrait;
use crate::assets::AssetRepositoryTrait;
use crate::constants::DECIMAL_PRECISION;
use crate::errors::Result;
use crate::positions::{Position, PositionRepositoryTrait};
use crate::prices::{PriceCacheStore, PriceMappingRepositoryTrait};
use crate::vaults::VaultRepositoryTrait;

/// Price picked for a holding.
struct ResolvedPrice {
    price: Decimal,
    date: NaiveDate,
    source: String,
}

pub struct ValuationService {
    position_repository: Arc<dyn PositionRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    mapping_repository: Arc<dyn PriceMappingRepositoryTrait>,
    price_cache: Arc<dyn PriceCacheStore>,
    vault_repository: Arc<dyn VaultRepositoryTrait>,
}

impl ValuationService {
    pub fn new(
        position_repository: Arc<dyn PositionRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        mapping_repository: Arc<dyn PriceMappingRepositoryTrait>,
        price_cache: Arc<dyn PriceCacheStore>,
        vault_repository: Arc<dyn VaultRepositoryTrait>,
    ) -> Self {
        Self {
            position_repository,
            asset_repository,
            mapping_repository,
            price_cache,
            vault_repository,
        }
    }

    /// Cash is worth one unit of itself. Other assets take the latest cached
    /// price on or before `as_of` from their active mappings, in mapping
    /// order.
    fn resolve_price(&self, asset_id: &str, as_of: NaiveDate) -> Result<Option<ResolvedPrice>> {
        let asset = self.asset_repository.get_by_id(asset_id)?;
        if asset.is_cash() {
            return Ok(Some(ResolvedPrice {
                price: Decimal::ONE,
                date: as_of,
                source: CASH_PRICE_SOURCE.to_string(),
            }));
        }

        for mapping in self
            .mapping_repository
            .list_for_asset(asset_id)?
            .into_iter()
            .filter(|m| m.is_active)
        {
            if let Some(cached) = self.price_cache.latest_on_or_before(
                &mapping.provider_symbol,
                &mapping.currency,
                as_of,
            )? {
                debug!(
                    "Priced {} at {} from {} {} on {}",
                    asset_id, cached.price, mapping.provider_symbol, mapping.currency, cached.date
                );
                return Ok(Some(ResolvedPrice {
                    price: cached.price,
                    date: cached.date,
                    source: cached.source,
                }));
            }
        }
        Ok(None)
    }

    fn value_lot(&self, position: &Position, as_of: NaiveDate) -> Result<HoldingValuation> {
        let quantity = position.remaining_quantity().max(Decimal::ZERO);
        let cost_basis = position.remaining_cost_basis();
        let resolved = self.resolve_price(&position.key.asset_id, as_of)?;
        if resolved.is_none() {
            warn!(
                "No cached price for {} on or before {}",
                position.key.asset_id, as_of
            );
        }

        Ok(HoldingValuation {
            position_id: position.id.clone(),
            asset_id: position.key.asset_id.clone(),
            account_id: position.key.account_id.clone(),
            quantity,
            cost_basis,
            price: resolved.as_ref().map(|p| p.price),
            price_date: resolved.as_ref().map(|p| p.date),
            market_value: resolved
                .as_ref()
                .map(|p| position.market_value(p.price).round_dp(DECIMAL_PRECISION)),
            unrealized_pnl: resolved
                .as_ref()
                .map(|p| position.unrealized_pnl(p.price).round_dp(DECIMAL_PRECISION)),
            price_source: resolved.map(|p| p.source),
        })
    }
}

impl ValuationServiceTrait for ValuationService {
    fn value_position(&self, position_id: &str, as_of: NaiveDate) -> Result<HoldingValuation> {
        let position = self.position_repository.get_by_id(position_id)?;
        self.value_lot(&position, as_of)
    }

    fn value_account(&self, account_id: &str, as_of: NaiveDate) -> Result<AccountValuation> {
        let holdings = self
            .position_repository
            .list_by_account(account_id)?
            .iter()
            .filter(|p| p.is_open)
            .map(|p| self.value_lot(p, as_of))
            .collect::<Result<Vec<_>>>()?;

        let mut market_value = Decimal::ZERO;
        let mut cost_basis = Decimal::ZERO;
        let mut unrealized_pnl = Decimal::ZERO;
        let mut unpriced_assets = Vec::new();
        for holding in &holdings {
            match (holding.market_value, holding.unrealized_pnl) {
                (Some(value), Some(pnl)) => {
                    market_value += value;
                    cost_basis += holding.cost_basis;
                    unrealized_pnl += pnl;
                }
                _ => {
                    if !unpriced_assets.contains(&holding.asset_id) {
                        unpriced_assets.push(holding.asset_id.clone());
                    }
                }
            }
        }

        Ok(AccountValuation {
            account_id: account_id.to_string(),
            as_of,
            holdings,
            market_value,
            cost_basis,
            unrealized_pnl,
            unpriced_assets,
        })
    }

    fn value_vault(&self, vault_id: &str, user_id: Option<&str>) -> Result<VaultValuation> {
        let vault = self.vault_repository.get_by_id(vault_id)?;
        let share_price = vault.share_price();

        let (user_shares, user_value, user_unrealized_pnl) = match user_id {
            Some(user_id) => match self.vault_repository.get_share(vault_id, user_id)? {
                Some(share) => {
                    let value = share.market_value(share_price).round_dp(DECIMAL_PRECISION);
                    (
                        Some(share.share_balance),
                        Some(value),
                        Some(value - share.total_cost),
                    )
                }
                None => (Some(Decimal::ZERO), Some(Decimal::ZERO), Some(Decimal::ZERO)),
            },
            None => (None, None, None),
        };

        Ok(VaultValuation {
            vault_id: vault.id.clone(),
            currency: vault.currency.clone(),
            supply: vault.supply(),
            share_price,
            aum: vault.aum,
            is_manual: vault.is_manual(),
            user_id: user_id.map(str::to_string),
            user_shares,
            user_value,
            user_unrealized_pnl,
        })
    }
}
