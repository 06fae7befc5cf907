use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerfolio_core::prices::{PriceMapping, PriceMappingRepositoryTrait};
use ledgerfolio_core::{Error, Result};

use super::model::PriceMappingDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::price_mappings;

pub struct PriceMappingRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PriceMappingRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PriceMappingRepositoryTrait for PriceMappingRepository {
    async fn create(&self, mapping: PriceMapping) -> Result<PriceMapping> {
        let row = PriceMappingDB::from(&mapping);
        self.writer
            .exec(move |conn| {
                diesel::insert_into(price_mappings::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(mapping)
            })
            .await
    }

    fn get_by_id(&self, mapping_id: &str) -> Result<PriceMapping> {
        let mut conn = get_connection(&self.pool)?;
        price_mappings::table
            .select(PriceMappingDB::as_select())
            .find(mapping_id)
            .first::<PriceMappingDB>(&mut conn)
            .optional()
            .into_core()?
            .map(PriceMapping::from)
            .ok_or_else(|| Error::not_found("Price mapping", mapping_id))
    }

    /// Mappings in the order they were added; valuation tries them in turn.
    fn list_for_asset(&self, asset_id: &str) -> Result<Vec<PriceMapping>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = price_mappings::table
            .select(PriceMappingDB::as_select())
            .filter(price_mappings::asset_id.eq(asset_id))
            .order((price_mappings::created_at.asc(), price_mappings::id.asc()))
            .load::<PriceMappingDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(PriceMapping::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDb;
    use chrono::{Duration, Utc};
    use ledgerfolio_core::errors::ErrorKind;
    use ledgerfolio_core::prices::NewPriceMapping;

    fn new_mapping(asset_id: &str, symbol: &str, currency: &str) -> NewPriceMapping {
        NewPriceMapping {
            asset_id: asset_id.to_string(),
            provider_symbol: symbol.to_string(),
            currency: currency.to_string(),
            provider: "yahoo".to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_list_for_asset_keeps_insertion_order() {
        let db = TestDb::new();
        db.insert_asset("BTC", "CRYPTO");
        db.insert_asset("ETH", "CRYPTO");
        let repo = PriceMappingRepository::new(db.pool.clone(), db.writer.clone());
        let now = Utc::now();

        let usd = repo
            .create(new_mapping("BTC", "BTC-USD", "usd").into_mapping(now))
            .await
            .unwrap();
        let eur = repo
            .create(new_mapping("BTC", "BTC-EUR", "eur").into_mapping(now + Duration::seconds(1)))
            .await
            .unwrap();
        repo.create(new_mapping("ETH", "ETH-USD", "usd").into_mapping(now))
            .await
            .unwrap();

        let ids: Vec<String> = repo
            .list_for_asset("BTC")
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![usd.id.clone(), eur.id]);
        let loaded = repo.get_by_id(&usd.id).unwrap();
        assert_eq!(loaded.currency, "USD");
        assert_eq!(loaded.provider, "YAHOO");
    }

    #[tokio::test]
    async fn test_mapping_requires_known_asset() {
        let db = TestDb::new();
        let repo = PriceMappingRepository::new(db.pool.clone(), db.writer.clone());

        let err = repo
            .create(new_mapping("NOPE", "NOPE", "USD").into_mapping(Utc::now()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(
            repo.get_by_id("missing").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
