use async_trait::async_trait;

use super::transactions_model::{
    DerivedFields, NewTransaction, RecalculationSummary, Transaction,
};
use crate::errors::Result;
use crate::positions::Position;

/// Persistence contract for transactions.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Saves the transaction and, when given, the lot it moved, in one
    /// storage transaction.
    async fn create(
        &self,
        transaction: Transaction,
        position: Option<Position>,
    ) -> Result<Transaction>;

    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction>;

    /// Transactions ordered by date, optionally for one account.
    fn list(&self, account_id: Option<&str>) -> Result<Vec<Transaction>>;

    /// Replaces the stored derived fields. Everything else is immutable.
    async fn update_derived(&self, transaction_id: &str, derived: DerivedFields) -> Result<()>;
}

#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    async fn create_transaction(
        &self,
        new_transaction: NewTransaction,
        actor: &str,
    ) -> Result<Transaction>;

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;

    fn list_transactions(&self, account_id: Option<&str>) -> Result<Vec<Transaction>>;

    /// Re-runs the calculator over every stored transaction using its stored
    /// FX snapshot and rewrites derived fields that differ.
    async fn recalculate_all(&self) -> Result<RecalculationSummary>;
}
