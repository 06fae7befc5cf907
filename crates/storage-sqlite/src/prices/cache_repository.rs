use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use diesel::upsert::excluded;
use std::sync::Arc;

use ledgerfolio_core::prices::{CachedPrice, PriceCacheStore};
use ledgerfolio_core::Result;

use super::model::CachedPriceDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::price_cache;
use crate::utils::format_date;

/// Daily prices keyed by (symbol, currency, date). Symbols and currencies are
/// stored uppercased; a second write for the same day replaces the price.
pub struct PriceCacheRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PriceCacheRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PriceCacheStore for PriceCacheRepository {
    async fn upsert_prices(&self, prices: Vec<CachedPrice>) -> Result<usize> {
        if prices.is_empty() {
            return Ok(0);
        }
        let rows: Vec<CachedPriceDB> = prices.iter().map(CachedPriceDB::from).collect();

        self.writer
            .exec(move |conn| {
                let mut total_upserted = 0;
                for row in &rows {
                    total_upserted += diesel::insert_into(price_cache::table)
                        .values(row)
                        .on_conflict((price_cache::symbol, price_cache::currency, price_cache::date))
                        .do_update()
                        .set((
                            price_cache::price.eq(excluded(price_cache::price)),
                            price_cache::source.eq(excluded(price_cache::source)),
                            price_cache::fetched_at.eq(excluded(price_cache::fetched_at)),
                        ))
                        .execute(conn)
                        .into_core()?;
                }
                Ok(total_upserted)
            })
            .await
    }

    fn get_price(
        &self,
        symbol: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<CachedPrice>> {
        let mut conn = get_connection(&self.pool)?;
        let row = price_cache::table
            .select(CachedPriceDB::as_select())
            .filter(price_cache::symbol.eq(symbol.to_uppercase()))
            .filter(price_cache::currency.eq(currency.to_uppercase()))
            .filter(price_cache::date.eq(format_date(&date)))
            .first::<CachedPriceDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(CachedPrice::from))
    }

    fn get_range(
        &self,
        symbol: &str,
        currency: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CachedPrice>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = price_cache::table
            .select(CachedPriceDB::as_select())
            .filter(price_cache::symbol.eq(symbol.to_uppercase()))
            .filter(price_cache::currency.eq(currency.to_uppercase()))
            .filter(price_cache::date.ge(format_date(&start)))
            .filter(price_cache::date.le(format_date(&end)))
            .order(price_cache::date.asc())
            .load::<CachedPriceDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(CachedPrice::from).collect())
    }

    fn latest_on_or_before(
        &self,
        symbol: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<CachedPrice>> {
        let mut conn = get_connection(&self.pool)?;
        let row = price_cache::table
            .select(CachedPriceDB::as_select())
            .filter(price_cache::symbol.eq(symbol.to_uppercase()))
            .filter(price_cache::currency.eq(currency.to_uppercase()))
            .filter(price_cache::date.le(format_date(&date)))
            .order(price_cache::date.desc())
            .first::<CachedPriceDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(CachedPrice::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDb;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_day() {
        let db = TestDb::new();
        let repo = PriceCacheRepository::new(db.pool.clone(), db.writer.clone());
        let now = Utc::now();

        repo.upsert_prices(vec![CachedPrice::new("btc-usd", "usd", day(1), dec!(61000), "YAHOO", now)])
            .await
            .unwrap();
        repo.upsert_prices(vec![CachedPrice::new("BTC-USD", "USD", day(1), dec!(61500.25), "YAHOO", now)])
            .await
            .unwrap();

        let price = repo.get_price("btc-usd", "usd", day(1)).unwrap().unwrap();
        assert_eq!(price.price, dec!(61500.25));
        assert_eq!(repo.get_range("BTC-USD", "USD", day(1), day(31)).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_range_and_latest_on_or_before() {
        let db = TestDb::new();
        let repo = PriceCacheRepository::new(db.pool.clone(), db.writer.clone());
        let now = Utc::now();
        let prices = [(1, dec!(100)), (2, dec!(101)), (4, dec!(104)), (10, dec!(110))]
            .into_iter()
            .map(|(d, p)| CachedPrice::new("AAPL", "USD", day(d), p, "YAHOO", now))
            .collect::<Vec<_>>();
        assert_eq!(repo.upsert_prices(prices).await.unwrap(), 4);

        let range: Vec<NaiveDate> = repo
            .get_range("AAPL", "USD", day(2), day(9))
            .unwrap()
            .into_iter()
            .map(|p| p.date)
            .collect();
        assert_eq!(range, vec![day(2), day(4)]);

        // Weekend falls back to the last trading day.
        let latest = repo.latest_on_or_before("AAPL", "USD", day(3)).unwrap().unwrap();
        assert_eq!(latest.date, day(2));
        assert_eq!(latest.price, dec!(101));
        assert!(repo
            .latest_on_or_before("AAPL", "EUR", day(3))
            .unwrap()
            .is_none());
        assert!(repo.get_price("AAPL", "USD", day(3)).unwrap().is_none());
    }
}
