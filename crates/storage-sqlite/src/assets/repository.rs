use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerfolio_core::assets::{Asset, AssetRepositoryTrait, NewAsset};
use ledgerfolio_core::{Error, Result};

use super::model::AssetDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::assets;

pub struct AssetRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AssetRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl AssetRepositoryTrait for AssetRepository {
    async fn create(&self, new_asset: NewAsset) -> Result<Asset> {
        new_asset.validate()?;
        let asset_db: AssetDB = new_asset.into();

        self.writer
            .exec(move |conn| {
                diesel::insert_into(assets::table)
                    .values(&asset_db)
                    .execute(conn)
                    .into_core()?;
                Ok(asset_db.into())
            })
            .await
    }

    fn get_by_id(&self, asset_id: &str) -> Result<Asset> {
        let mut conn = get_connection(&self.pool)?;
        assets::table
            .select(AssetDB::as_select())
            .find(asset_id)
            .first::<AssetDB>(&mut conn)
            .optional()
            .into_core()?
            .map(Asset::from)
            .ok_or_else(|| Error::not_found("Asset", asset_id))
    }

    fn list(&self) -> Result<Vec<Asset>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = assets::table
            .select(AssetDB::as_select())
            .order(assets::symbol.asc())
            .load::<AssetDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Asset::from).collect())
    }

    async fn delete(&self, asset_id: &str) -> Result<()> {
        let asset_id = asset_id.to_string();
        self.writer
            .exec(move |conn| {
                let deleted = diesel::delete(assets::table.find(&asset_id))
                    .execute(conn)
                    .into_core()?;
                if deleted == 0 {
                    return Err(Error::not_found("Asset", &asset_id));
                }
                Ok(())
            })
            .await
    }
}
