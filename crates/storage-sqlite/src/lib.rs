//! SQLite storage implementation for Ledgerfolio.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `ledgerfolio-core` and contains:
//! - Database connection pooling and the single writer actor
//! - Diesel migrations
//! - Repository implementations for all domain entities
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! `core` is database-agnostic and works with traits.
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!  storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod accounts;
pub mod assets;
pub mod positions;
pub mod prices;
pub mod transactions;
pub mod vaults;

#[cfg(test)]
mod test_utils;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export repositories
pub use accounts::AccountRepository;
pub use assets::AssetRepository;
pub use positions::PositionRepository;
pub use prices::{PriceCacheRepository, PriceJobRepository, PriceMappingRepository};
pub use transactions::TransactionRepository;
pub use vaults::VaultRepository;

// Re-export from ledgerfolio-core for convenience
pub use ledgerfolio_core::errors::{DatabaseError, Error, Result};
