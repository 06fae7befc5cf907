use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerfolio_core::positions::Position;
use ledgerfolio_core::transactions::{DerivedFields, Transaction, TransactionRepositoryTrait};
use ledgerfolio_core::{Error, Result};

use super::model::{derived_to_json, TransactionDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::positions::{upsert_position, PositionDB};
use crate::schema::transactions;

pub struct TransactionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    async fn create(
        &self,
        transaction: Transaction,
        position: Option<Position>,
    ) -> Result<Transaction> {
        let row = TransactionDB::try_from(&transaction)?;
        let position_row = position.as_ref().map(PositionDB::from);

        self.writer
            .exec(move |conn| {
                diesel::insert_into(transactions::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                if let Some(position_row) = position_row {
                    upsert_position(conn, &position_row)?;
                }
                Ok(transaction)
            })
            .await
    }

    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        transactions::table
            .select(TransactionDB::as_select())
            .find(transaction_id)
            .first::<TransactionDB>(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| Error::not_found("Transaction", transaction_id))
            .and_then(Transaction::try_from)
    }

    fn list(&self, account_id: Option<&str>) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = transactions::table
            .select(TransactionDB::as_select())
            .into_boxed();
        if let Some(account_id) = account_id {
            query = query.filter(transactions::account_id.eq(account_id.to_string()));
        }

        query
            .order((
                transactions::transaction_date.asc(),
                transactions::created_at.asc(),
            ))
            .load::<TransactionDB>(&mut conn)
            .into_core()?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    async fn update_derived(&self, transaction_id: &str, derived: DerivedFields) -> Result<()> {
        let transaction_id = transaction_id.to_string();
        let json = derived_to_json(&derived)?;

        self.writer
            .exec(move |conn| {
                let updated = diesel::update(transactions::table.find(&transaction_id))
                    .set(transactions::derived.eq(json))
                    .execute(conn)
                    .into_core()?;
                if updated == 0 {
                    return Err(Error::not_found("Transaction", &transaction_id));
                }
                Ok(())
            })
            .await
    }
}
