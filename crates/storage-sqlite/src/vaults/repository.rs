use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use ledgerfolio_core::vaults::{Vault, VaultRepositoryTrait, VaultShare, VaultTransaction};
use ledgerfolio_core::{Error, Result};

use super::model::{VaultDB, VaultShareDB, VaultTransactionDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{vault_shares, vault_transactions, vaults};

pub struct VaultRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl VaultRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl VaultRepositoryTrait for VaultRepository {
    fn get_by_id(&self, vault_id: &str) -> Result<Vault> {
        let mut conn = get_connection(&self.pool)?;
        vaults::table
            .select(VaultDB::as_select())
            .find(vault_id)
            .first::<VaultDB>(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| Error::not_found("Vault", vault_id))
            .and_then(Vault::try_from)
    }

    fn list(&self) -> Result<Vec<Vault>> {
        let mut conn = get_connection(&self.pool)?;
        vaults::table
            .select(VaultDB::as_select())
            .order(vaults::name.asc())
            .load::<VaultDB>(&mut conn)
            .into_core()?
            .into_iter()
            .map(Vault::try_from)
            .collect()
    }

    async fn create(&self, vault: Vault) -> Result<Vault> {
        let row = VaultDB::try_from(&vault)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(vaults::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(vault)
            })
            .await
    }

    async fn save_vault_mutation(
        &self,
        vault: Vault,
        share: Option<VaultShare>,
        entries: Vec<VaultTransaction>,
    ) -> Result<()> {
        let vault_row = VaultDB::try_from(&vault)?;
        let share_row = share.as_ref().map(VaultShareDB::from);
        let entry_rows: Vec<VaultTransactionDB> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| VaultTransactionDB::from_entry(entry, i as i32))
            .collect();

        self.writer
            .exec(move |conn| {
                let updated = diesel::update(vaults::table.find(&vault_row.id))
                    .set(&vault_row)
                    .execute(conn)
                    .into_core()?;
                if updated == 0 {
                    return Err(Error::not_found("Vault", &vault_row.id));
                }

                if let Some(share_row) = share_row {
                    diesel::insert_into(vault_shares::table)
                        .values(&share_row)
                        .on_conflict(vault_shares::id)
                        .do_update()
                        .set(&share_row)
                        .execute(conn)
                        .into_core()?;
                }

                if !entry_rows.is_empty() {
                    diesel::insert_into(vault_transactions::table)
                        .values(&entry_rows)
                        .execute(conn)
                        .into_core()?;
                }
                debug!(
                    "Saved vault {} with {} ledger entries",
                    vault_row.id,
                    entry_rows.len()
                );
                Ok(())
            })
            .await
    }

    fn get_share(&self, vault_id: &str, user_id: &str) -> Result<Option<VaultShare>> {
        let mut conn = get_connection(&self.pool)?;
        let row = vault_shares::table
            .select(VaultShareDB::as_select())
            .filter(vault_shares::vault_id.eq(vault_id))
            .filter(vault_shares::user_id.eq(user_id))
            .first::<VaultShareDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(VaultShare::from))
    }

    fn list_transactions(&self, vault_id: &str) -> Result<Vec<VaultTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        vault_transactions::table
            .select(VaultTransactionDB::as_select())
            .filter(vault_transactions::vault_id.eq(vault_id))
            .order((
                vault_transactions::created_at.asc(),
                vault_transactions::entry_index.asc(),
            ))
            .load::<VaultTransactionDB>(&mut conn)
            .into_core()?
            .into_iter()
            .map(VaultTransaction::try_from)
            .collect()
    }
}
