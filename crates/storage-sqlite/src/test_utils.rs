//! Temp-file databases for repository tests.

use std::sync::Arc;

use diesel::RunQueryDsl;
use tempfile::TempDir;

use crate::db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbPool};
use crate::WriteHandle;

pub struct TestDb {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
    _dir: TempDir,
}

impl TestDb {
    /// Migrated database in a fresh temp directory. Must be called inside a
    /// tokio runtime because it spawns the writer.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = dir.path().join("test.db").to_string_lossy().to_string();
        init(&db_path).expect("Failed to init database");
        let pool = create_pool(&db_path).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        Self {
            pool,
            writer,
            _dir: dir,
        }
    }

    /// Inserts an account row to satisfy foreign keys.
    pub fn insert_account(&self, account_id: &str) {
        let mut conn = get_connection(&self.pool).expect("Failed to get connection");
        diesel::sql_query(format!(
            "INSERT INTO accounts (id, name, account_type, currency, is_active, created_at, updated_at) \
             VALUES ('{}', 'Test Account', 'BROKERAGE', 'USD', true, datetime('now'), datetime('now'))",
            account_id
        ))
        .execute(&mut conn)
        .expect("Failed to create test account");
    }

    /// Inserts an asset row to satisfy foreign keys.
    pub fn insert_asset(&self, asset_id: &str, kind: &str) {
        let mut conn = get_connection(&self.pool).expect("Failed to get connection");
        diesel::sql_query(format!(
            "INSERT INTO assets (id, symbol, name, kind, currency, created_at, updated_at) \
             VALUES ('{0}', '{0}', NULL, '{1}', 'USD', datetime('now'), datetime('now'))",
            asset_id, kind
        ))
        .execute(&mut conn)
        .expect("Failed to create test asset");
    }
}
