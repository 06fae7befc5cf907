use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerfolio_core::accounts::{Account, AccountRepositoryTrait, AccountUpdate, NewAccount};
use ledgerfolio_core::{Error, Result};

use super::model::AccountDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::accounts;
use crate::schema::accounts::dsl::*;

/// Repository for managing account data in the database
pub struct AccountRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AccountRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;

        self.writer
            .exec(move |conn| {
                let mut account_db: AccountDB = new_account.into();
                if account_db.id.is_empty() {
                    account_db.id = uuid::Uuid::new_v4().to_string();
                }

                diesel::insert_into(accounts::table)
                    .values(&account_db)
                    .execute(conn)
                    .into_core()?;

                Account::try_from(account_db)
            })
            .await
    }

    async fn update(&self, account_update: AccountUpdate) -> Result<Account> {
        account_update.validate()?;

        self.writer
            .exec(move |conn| {
                let account_id = account_update.id.unwrap_or_default();
                let mut account_db = accounts
                    .select(AccountDB::as_select())
                    .find(&account_id)
                    .first::<AccountDB>(conn)
                    .optional()
                    .into_core()?
                    .ok_or_else(|| Error::not_found("Account", &account_id))?;

                account_db.name = account_update.name.trim().to_string();
                account_db.account_type = account_update.account_type.as_str().to_string();
                account_db.is_active = account_update.is_active;
                account_db.updated_at = chrono::Utc::now().naive_utc();

                diesel::update(accounts.find(&account_db.id))
                    .set(&account_db)
                    .execute(conn)
                    .into_core()?;

                Account::try_from(account_db)
            })
            .await
    }

    /// Deletes an account by its ID and returns the number of deleted records
    async fn delete(&self, account_id_param: &str) -> Result<usize> {
        let id_to_delete_owned = account_id_param.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(accounts.find(id_to_delete_owned))
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)?;

        accounts
            .select(AccountDB::as_select())
            .find(account_id)
            .first::<AccountDB>(&mut conn)
            .optional()
            .into_core()?
            .map(Account::try_from)
            .transpose()?
            .ok_or_else(|| Error::not_found("Account", account_id))
    }

    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = accounts::table.into_boxed();
        if let Some(active) = is_active_filter {
            query = query.filter(is_active.eq(active));
        }

        let results = query
            .select(AccountDB::as_select())
            .order((is_active.desc(), name.asc()))
            .load::<AccountDB>(&mut conn)
            .into_core()?;

        results.into_iter().map(Account::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDb;
    use ledgerfolio_core::accounts::AccountType;
    use ledgerfolio_core::errors::ErrorKind;

    fn new_account(account_name: &str, active: bool) -> NewAccount {
        NewAccount {
            id: None,
            name: account_name.to_string(),
            account_type: AccountType::Brokerage,
            currency: "usd".to_string(),
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_account() {
        let db = TestDb::new();
        let repo = AccountRepository::new(db.pool.clone(), db.writer.clone());

        let created = repo.create(new_account("Broker", true)).await.unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.currency, "USD");

        let loaded = repo.get_by_id(&created.id).unwrap();
        assert_eq!(loaded.name, "Broker");
        assert_eq!(loaded.account_type, AccountType::Brokerage);
    }

    #[tokio::test]
    async fn test_missing_account_is_not_found() {
        let db = TestDb::new();
        let repo = AccountRepository::new(db.pool.clone(), db.writer.clone());

        let err = repo.get_by_id("nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = repo
            .update(AccountUpdate {
                id: Some("nope".to_string()),
                name: "x".to_string(),
                account_type: AccountType::Cash,
                is_active: true,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_keeps_currency_and_list_filters() {
        let db = TestDb::new();
        let repo = AccountRepository::new(db.pool.clone(), db.writer.clone());
        let a = repo.create(new_account("Alpha", true)).await.unwrap();
        repo.create(new_account("Beta", false)).await.unwrap();

        let updated = repo
            .update(AccountUpdate {
                id: Some(a.id.clone()),
                name: "Alpha Wallet".to_string(),
                account_type: AccountType::Wallet,
                is_active: true,
            })
            .await
            .unwrap();
        assert_eq!(updated.currency, "USD");
        assert_eq!(updated.account_type, AccountType::Wallet);

        assert_eq!(repo.list(None).unwrap().len(), 2);
        let active = repo.list(Some(true)).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Alpha Wallet");

        assert_eq!(repo.delete(&a.id).await.unwrap(), 1);
        assert_eq!(repo.list(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_account_type_is_rejected_on_read() {
        let db = TestDb::new();
        let repo = AccountRepository::new(db.pool.clone(), db.writer.clone());
        db.insert_account("acc-odd");
        let mut conn = get_connection(&db.pool).unwrap();
        diesel::sql_query("UPDATE accounts SET account_type = 'GOLD' WHERE id = 'acc-odd'")
            .execute(&mut conn)
            .unwrap();

        let err = repo.get_by_id("acc-odd").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(repo.list(None).is_err());
    }
}
