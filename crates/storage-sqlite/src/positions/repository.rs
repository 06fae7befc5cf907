use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerfolio_core::positions::{Position, PositionKey, PositionRepositoryTrait};
use ledgerfolio_core::{Error, Result};

use super::model::PositionDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::positions;

pub struct PositionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PositionRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

/// Inserts a lot or updates it in place by id. Shared with the transaction
/// repository, which saves the lot next to the transaction.
/// A second open lot for the same key fails on the partial unique index.
pub(crate) fn upsert_position(conn: &mut SqliteConnection, row: &PositionDB) -> Result<()> {
    diesel::insert_into(positions::table)
        .values(row)
        .on_conflict(positions::id)
        .do_update()
        .set(row)
        .execute(conn)
        .into_core()?;
    Ok(())
}

#[async_trait]
impl PositionRepositoryTrait for PositionRepository {
    fn get_by_id(&self, position_id: &str) -> Result<Position> {
        let mut conn = get_connection(&self.pool)?;
        positions::table
            .select(PositionDB::as_select())
            .find(position_id)
            .first::<PositionDB>(&mut conn)
            .optional()
            .into_core()?
            .map(Position::from)
            .ok_or_else(|| Error::not_found("Position", position_id))
    }

    fn find_open_by_key(&self, key: &PositionKey) -> Result<Option<Position>> {
        let mut conn = get_connection(&self.pool)?;
        let row = positions::table
            .select(PositionDB::as_select())
            .filter(positions::asset_id.eq(&key.asset_id))
            .filter(positions::account_id.eq(&key.account_id))
            .filter(positions::horizon.eq(key.horizon.as_str()))
            .filter(positions::is_open.eq(true))
            .first::<PositionDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(Position::from))
    }

    fn list_by_account(&self, account_id: &str) -> Result<Vec<Position>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = positions::table
            .select(PositionDB::as_select())
            .filter(positions::account_id.eq(account_id))
            .order(positions::opened_at.asc())
            .load::<PositionDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Position::from).collect())
    }

    async fn save(&self, position: Position) -> Result<Position> {
        let row = PositionDB::from(&position);
        self.writer
            .exec(move |conn| {
                upsert_position(conn, &row)?;
                Ok(position)
            })
            .await
    }

    async fn delete(&self, position_id: &str) -> Result<usize> {
        let position_id = position_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(positions::table.find(position_id))
                    .execute(conn)
                    .into_core()
            })
            .await
    }
}
