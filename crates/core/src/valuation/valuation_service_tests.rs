#[cfg(test)]
mod tests {
    use crate::assets::{Asset, AssetKind, AssetRepositoryTrait, NewAsset};
    use crate::errors::{ErrorKind, Result};
    use crate::positions::{Horizon, Position, PositionKey, PositionRepositoryTrait};
    use crate::prices::{CachedPrice, PriceCacheStore, PriceMapping, PriceMappingRepositoryTrait};
    use crate::valuation::{ValuationService, ValuationServiceTrait, CASH_PRICE_SOURCE};
    use crate::vaults::{
        ManualPricing, Vault, VaultKind, VaultRepositoryTrait, VaultShare, VaultStatus,
        VaultTransaction,
    };
    use crate::Error;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    // --- Mock PositionRepository ---
    #[derive(Clone, Default)]
    struct MockPositionRepository {
        positions: Arc<Mutex<Vec<Position>>>,
    }

    #[async_trait]
    impl PositionRepositoryTrait for MockPositionRepository {
        fn get_by_id(&self, position_id: &str) -> Result<Position> {
            self.positions
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == position_id)
                .cloned()
                .ok_or_else(|| Error::not_found("Position", position_id))
        }

        fn find_open_by_key(&self, _key: &PositionKey) -> Result<Option<Position>> {
            unimplemented!()
        }

        fn list_by_account(&self, account_id: &str) -> Result<Vec<Position>> {
            Ok(self
                .positions
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.key.account_id == account_id)
                .cloned()
                .collect())
        }

        async fn save(&self, _position: Position) -> Result<Position> {
            unimplemented!()
        }

        async fn delete(&self, _position_id: &str) -> Result<usize> {
            unimplemented!()
        }
    }

    // --- Mock AssetRepository ---
    #[derive(Clone, Default)]
    struct MockAssetRepository {
        assets: Arc<Mutex<Vec<Asset>>>,
    }

    #[async_trait]
    impl AssetRepositoryTrait for MockAssetRepository {
        async fn create(&self, _new_asset: NewAsset) -> Result<Asset> {
            unimplemented!()
        }

        fn get_by_id(&self, asset_id: &str) -> Result<Asset> {
            self.assets
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == asset_id)
                .cloned()
                .ok_or_else(|| Error::not_found("Asset", asset_id))
        }

        fn list(&self) -> Result<Vec<Asset>> {
            Ok(self.assets.lock().unwrap().clone())
        }

        async fn delete(&self, _asset_id: &str) -> Result<()> {
            unimplemented!()
        }
    }

    // --- Mock PriceMappingRepository ---
    #[derive(Clone, Default)]
    struct MockMappingRepository {
        mappings: Arc<Mutex<Vec<PriceMapping>>>,
    }

    #[async_trait]
    impl PriceMappingRepositoryTrait for MockMappingRepository {
        async fn create(&self, _mapping: PriceMapping) -> Result<PriceMapping> {
            unimplemented!()
        }

        fn get_by_id(&self, _mapping_id: &str) -> Result<PriceMapping> {
            unimplemented!()
        }

        fn list_for_asset(&self, asset_id: &str) -> Result<Vec<PriceMapping>> {
            Ok(self
                .mappings
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.asset_id == asset_id)
                .cloned()
                .collect())
        }
    }

    // --- Mock PriceCacheStore ---
    #[derive(Clone, Default)]
    struct MockPriceCache {
        rows: Arc<Mutex<Vec<CachedPrice>>>,
    }

    impl MockPriceCache {
        fn put(&self, symbol: &str, date: NaiveDate, price: Decimal) {
            self.rows
                .lock()
                .unwrap()
                .push(CachedPrice::new(symbol, "USD", date, price, "YAHOO", at()));
        }
    }

    #[async_trait]
    impl PriceCacheStore for MockPriceCache {
        async fn upsert_prices(&self, _prices: Vec<CachedPrice>) -> Result<usize> {
            unimplemented!()
        }

        fn get_price(
            &self,
            _symbol: &str,
            _currency: &str,
            _date: NaiveDate,
        ) -> Result<Option<CachedPrice>> {
            unimplemented!()
        }

        fn get_range(
            &self,
            _symbol: &str,
            _currency: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<CachedPrice>> {
            unimplemented!()
        }

        fn latest_on_or_before(
            &self,
            symbol: &str,
            currency: &str,
            date: NaiveDate,
        ) -> Result<Option<CachedPrice>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.symbol == symbol && p.currency == currency && p.date <= date)
                .max_by_key(|p| p.date)
                .cloned())
        }
    }

    // --- Mock VaultRepository ---
    #[derive(Clone, Default)]
    struct MockVaultRepository {
        vaults: Arc<Mutex<Vec<Vault>>>,
        shares: Arc<Mutex<Vec<VaultShare>>>,
    }

    #[async_trait]
    impl VaultRepositoryTrait for MockVaultRepository {
        fn get_by_id(&self, vault_id: &str) -> Result<Vault> {
            self.vaults
                .lock()
                .unwrap()
                .iter()
                .find(|v| v.id == vault_id)
                .cloned()
                .ok_or_else(|| Error::not_found("Vault", vault_id))
        }

        fn list(&self) -> Result<Vec<Vault>> {
            Ok(self.vaults.lock().unwrap().clone())
        }

        async fn create(&self, _vault: Vault) -> Result<Vault> {
            unimplemented!()
        }

        async fn save_vault_mutation(
            &self,
            _vault: Vault,
            _share: Option<VaultShare>,
            _entries: Vec<VaultTransaction>,
        ) -> Result<()> {
            unimplemented!()
        }

        fn get_share(&self, vault_id: &str, user_id: &str) -> Result<Option<VaultShare>> {
            Ok(self
                .shares
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.vault_id == vault_id && s.user_id == user_id)
                .cloned())
        }

        fn list_transactions(&self, _vault_id: &str) -> Result<Vec<VaultTransaction>> {
            unimplemented!()
        }
    }

    struct Fixture {
        service: ValuationService,
        positions: MockPositionRepository,
        mappings: MockMappingRepository,
        cache: MockPriceCache,
        vaults: MockVaultRepository,
    }

    fn mapping(id: &str, asset_id: &str, symbol: &str, is_active: bool) -> PriceMapping {
        PriceMapping {
            id: id.to_string(),
            asset_id: asset_id.to_string(),
            provider_symbol: symbol.to_string(),
            currency: "USD".to_string(),
            provider: "YAHOO".to_string(),
            is_active,
            created_at: at(),
        }
    }

    fn fixture() -> Fixture {
        let assets = MockAssetRepository::default();
        assets.assets.lock().unwrap().extend([
            Asset {
                id: "BTC".to_string(),
                symbol: "BTC".to_string(),
                kind: AssetKind::Crypto,
                currency: "USD".to_string(),
                ..Default::default()
            },
            Asset {
                id: "AAPL".to_string(),
                symbol: "AAPL".to_string(),
                kind: AssetKind::Security,
                currency: "USD".to_string(),
                ..Default::default()
            },
            Asset {
                id: "USD".to_string(),
                symbol: "USD".to_string(),
                kind: AssetKind::Cash,
                currency: "USD".to_string(),
                ..Default::default()
            },
        ]);
        let mappings = MockMappingRepository::default();
        mappings
            .mappings
            .lock()
            .unwrap()
            .push(mapping("btc-yahoo", "BTC", "BTC-USD", true));

        let positions = MockPositionRepository::default();
        let cache = MockPriceCache::default();
        let vaults = MockVaultRepository::default();
        let service = ValuationService::new(
            Arc::new(positions.clone()),
            Arc::new(assets),
            Arc::new(mappings.clone()),
            Arc::new(cache.clone()),
            Arc::new(vaults.clone()),
        );
        Fixture {
            service,
            positions,
            mappings,
            cache,
            vaults,
        }
    }

    fn lot(f: &Fixture, asset_id: &str, quantity: Decimal, cost: Decimal) -> Position {
        let mut position = Position::open(PositionKey::new(asset_id, "acc-1", Horizon::Long), at());
        position.add_deposit(quantity, cost, at()).unwrap();
        f.positions.positions.lock().unwrap().push(position.clone());
        position
    }

    #[test]
    fn test_value_position_uses_price_of_the_day() {
        let f = fixture();
        let btc = lot(&f, "BTC", dec!(2), dec!(100000));
        f.cache.put("BTC-USD", d(2), dec!(55000));
        f.cache.put("BTC-USD", d(3), dec!(60000));

        let holding = f.service.value_position(&btc.id, d(3)).unwrap();
        assert_eq!(holding.quantity, dec!(2));
        assert_eq!(holding.price, Some(dec!(60000)));
        assert_eq!(holding.price_date, Some(d(3)));
        assert_eq!(holding.price_source.as_deref(), Some("YAHOO"));
        assert_eq!(holding.market_value, Some(dec!(120000)));
        assert_eq!(holding.cost_basis, dec!(100000));
        assert_eq!(holding.unrealized_pnl, Some(dec!(20000)));
    }

    #[test]
    fn test_value_position_falls_back_to_earlier_price() {
        let f = fixture();
        let btc = lot(&f, "BTC", dec!(1), dec!(50000));
        f.cache.put("BTC-USD", d(7), dec!(61000));
        f.cache.put("BTC-USD", d(10), dec!(64000));

        // 2024-06-09 is a Sunday
        let holding = f.service.value_position(&btc.id, d(9)).unwrap();
        assert_eq!(holding.price, Some(dec!(61000)));
        assert_eq!(holding.price_date, Some(d(7)));
        assert_eq!(holding.unrealized_pnl, Some(dec!(11000)));
    }

    #[test]
    fn test_inactive_mapping_is_skipped() {
        let f = fixture();
        f.mappings.mappings.lock().unwrap().extend([
            mapping("aapl-old", "AAPL", "AAPL.OLD", false),
            mapping("aapl-yahoo", "AAPL", "AAPL", true),
        ]);
        let aapl = lot(&f, "AAPL", dec!(10), dec!(1500));
        f.cache.put("AAPL.OLD", d(3), dec!(1));
        f.cache.put("AAPL", d(3), dec!(190));

        let holding = f.service.value_position(&aapl.id, d(3)).unwrap();
        assert_eq!(holding.price, Some(dec!(190)));
        assert_eq!(holding.market_value, Some(dec!(1900)));
    }

    #[test]
    fn test_unpriced_holding_keeps_cost_basis() {
        let f = fixture();
        let aapl = lot(&f, "AAPL", dec!(10), dec!(1500));

        let holding = f.service.value_position(&aapl.id, d(3)).unwrap();
        assert!(!holding.is_priced());
        assert_eq!(holding.market_value, None);
        assert_eq!(holding.unrealized_pnl, None);
        assert_eq!(holding.cost_basis, dec!(1500));
    }

    #[test]
    fn test_cash_is_valued_at_par() {
        let f = fixture();
        let cash = lot(&f, "USD", dec!(2500), dec!(2500));

        let holding = f.service.value_position(&cash.id, d(3)).unwrap();
        assert_eq!(holding.price, Some(Decimal::ONE));
        assert_eq!(holding.price_source.as_deref(), Some(CASH_PRICE_SOURCE));
        assert_eq!(holding.unrealized_pnl, Some(Decimal::ZERO));
    }

    #[test]
    fn test_value_account_totals_priced_open_lots() {
        let f = fixture();
        lot(&f, "BTC", dec!(1), dec!(50000));
        lot(&f, "USD", dec!(1000), dec!(1000));
        lot(&f, "AAPL", dec!(10), dec!(1500));
        let mut closed = lot(&f, "BTC", dec!(1), dec!(40000));
        closed.key.horizon = Horizon::Short;
        closed.add_withdrawal(dec!(1), dec!(45000), at(), false).unwrap();
        {
            let mut positions = f.positions.positions.lock().unwrap();
            positions.retain(|p| p.id != closed.id);
            positions.push(closed);
        }
        f.cache.put("BTC-USD", d(3), dec!(60000));

        let valuation = f.service.value_account("acc-1", d(3)).unwrap();
        assert_eq!(valuation.holdings.len(), 3);
        assert_eq!(valuation.market_value, dec!(61000));
        assert_eq!(valuation.cost_basis, dec!(51000));
        assert_eq!(valuation.unrealized_pnl, dec!(10000));
        assert_eq!(valuation.unpriced_assets, vec!["AAPL".to_string()]);
    }

    #[test]
    fn test_value_position_not_found() {
        let f = fixture();
        let err = f.service.value_position("missing", d(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    fn seed_vault(f: &Fixture) -> Vault {
        let mut vault = Vault {
            id: "vault-1".to_string(),
            name: "Income".to_string(),
            currency: "USD".to_string(),
            kind: VaultKind::Tokenized {
                total_shares: Decimal::ZERO,
            },
            aum: Decimal::ZERO,
            current_share_price: dec!(1),
            initial_share_price: dec!(1),
            manual_pricing: ManualPricing::default(),
            status: VaultStatus::Active,
            created_at: at(),
            updated_at: at(),
        };
        let minted = vault.deposit(dec!(1000), at()).unwrap();
        vault.record_yield(dec!(200), at()).unwrap();

        let mut share = VaultShare::new(&vault.id, "alice", at());
        share.mint_shares(minted.shares, minted.amount, at()).unwrap();
        f.vaults.vaults.lock().unwrap().push(vault.clone());
        f.vaults.shares.lock().unwrap().push(share);
        vault
    }

    #[test]
    fn test_value_vault_with_user_stake() {
        let f = fixture();
        let vault = seed_vault(&f);

        let valuation = f.service.value_vault(&vault.id, Some("alice")).unwrap();
        assert_eq!(valuation.supply, dec!(1000));
        assert_eq!(valuation.share_price, dec!(1.2));
        assert_eq!(valuation.aum, dec!(1200));
        assert!(!valuation.is_manual);
        assert_eq!(valuation.user_shares, Some(dec!(1000)));
        assert_eq!(valuation.user_value, Some(dec!(1200)));
        assert_eq!(valuation.user_unrealized_pnl, Some(dec!(200)));
    }

    #[test]
    fn test_value_vault_without_or_unknown_user() {
        let f = fixture();
        let vault = seed_vault(&f);

        let anonymous = f.service.value_vault(&vault.id, None).unwrap();
        assert_eq!(anonymous.user_id, None);
        assert_eq!(anonymous.user_value, None);

        let stranger = f.service.value_vault(&vault.id, Some("bob")).unwrap();
        assert_eq!(stranger.user_shares, Some(Decimal::ZERO));
        assert_eq!(stranger.user_value, Some(Decimal::ZERO));
    }
}
