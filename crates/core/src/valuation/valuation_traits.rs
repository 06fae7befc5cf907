use chrono::NaiveDate;

use super::valuation_model::{AccountValuation, HoldingValuation, VaultValuation};
use crate::errors::Result;

/// Read-side valuation. Nothing here mutates state.
pub trait ValuationServiceTrait: Send + Sync {
    fn value_position(&self, position_id: &str, as_of: NaiveDate) -> Result<HoldingValuation>;

    /// Values every open lot of the account.
    fn value_account(&self, account_id: &str, as_of: NaiveDate) -> Result<AccountValuation>;

    /// Values the vault at its current share price, plus the user's stake
    /// when `user_id` is given. A user without shares gets zeroes.
    fn value_vault(&self, vault_id: &str, user_id: Option<&str>) -> Result<VaultValuation>;
}
