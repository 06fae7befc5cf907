//! SQLite storage implementation for vaults, user shares and the vault ledger.

mod model;
mod repository;

pub use model::{VaultDB, VaultShareDB, VaultTransactionDB};
pub use repository::VaultRepository;
