use async_trait::async_trait;

use super::accounts_model::{Account, AccountUpdate, NewAccount};
use crate::errors::Result;

/// Persistence for accounts. Reads are synchronous; writes go through the
/// storage writer.
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    async fn create(&self, new_account: NewAccount) -> Result<Account>;

    async fn update(&self, account_update: AccountUpdate) -> Result<Account>;

    /// Number of rows removed. The account's lots and transactions go
    /// with it.
    async fn delete(&self, account_id: &str) -> Result<usize>;

    fn get_by_id(&self, account_id: &str) -> Result<Account>;

    /// Active accounts first, then by name.
    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>>;
}

#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    async fn create_account(&self, new_account: NewAccount) -> Result<Account>;

    async fn update_account(&self, account_update: AccountUpdate) -> Result<Account>;

    async fn delete_account(&self, account_id: &str) -> Result<()>;

    fn get_account(&self, account_id: &str) -> Result<Account>;

    fn list_accounts(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>>;
}
