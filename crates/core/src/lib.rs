//! Ledgerfolio Core - valuation and accounting engine.
//!
//! Accounts, assets, cost-basis lots, multi-currency transactions, share-priced
//! vaults and the daily price cache. The crate is storage-agnostic: every
//! service works against the repository traits implemented by
//! `ledgerfolio-storage-sqlite`.

pub mod accounts;
pub mod assets;
pub mod constants;
pub mod errors;
pub mod positions;
pub mod prices;
pub mod transactions;
pub mod utils;
pub mod valuation;
pub mod vaults;

// Re-export error types
pub use errors::Error;
pub use errors::ErrorKind;
pub use errors::Result;
