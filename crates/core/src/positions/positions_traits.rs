use async_trait::async_trait;

use super::positions_model::{Position, PositionKey};
use crate::errors::Result;
use crate::transactions::Transaction;

/// Persistence contract for investment lots.
#[async_trait]
pub trait PositionRepositoryTrait: Send + Sync {
    fn get_by_id(&self, position_id: &str) -> Result<Position>;

    /// The open lot for a key, if any. Closed lots are history and are never
    /// reopened.
    fn find_open_by_key(&self, key: &PositionKey) -> Result<Option<Position>>;

    fn list_by_account(&self, account_id: &str) -> Result<Vec<Position>>;

    /// Inserts or replaces the lot by id.
    async fn save(&self, position: Position) -> Result<Position>;

    async fn delete(&self, position_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait PositionServiceTrait: Send + Sync {
    /// Computes the lot a transaction would produce without saving it.
    ///
    /// Returns `None` when the transaction does not move a lot (cash assets,
    /// lending, valuations). Domain errors surface here, before any write.
    fn plan_transaction(&self, transaction: &Transaction) -> Result<Option<Position>>;

    /// Plans and saves the lot for a transaction.
    async fn apply_transaction(&self, transaction: &Transaction) -> Result<Option<Position>>;

    async fn close_position(&self, position_id: &str, force: bool, actor: &str)
        -> Result<Position>;

    async fn delete_position(&self, position_id: &str) -> Result<()>;

    fn get_position(&self, position_id: &str) -> Result<Position>;

    fn get_positions_for_account(&self, account_id: &str) -> Result<Vec<Position>>;
}
