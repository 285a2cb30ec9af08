// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQLite-backed durable state.
//!
//! One table, one row per key:
//! ```sql
//! CREATE TABLE kv_state (
//!   key TEXT PRIMARY KEY,
//!   value TEXT NOT NULL,
//!   updated_at INTEGER NOT NULL  -- epoch millis of last write
//! )
//! ```

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Row;
use tracing::{debug, info};

use super::{StateError, StateStore};
use crate::time::now_millis;

pub struct SqliteStateStore {
    pool: SqlitePool,
    path: String,
}

impl SqliteStateStore {
    /// Open (creating if needed) the state database at `path`.
    ///
    /// WAL journaling keeps readers from blocking the writer; `NORMAL`
    /// synchronous is safe under WAL.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                StateError::Backend(format!("Failed to open state store at {}: {}", path_str, e))
            })?;

        let store = Self { pool, path: path_str };
        store.init_schema().await?;

        info!(path = %store.path, "State store opened");
        Ok(store)
    }

    /// Get a clone of the connection pool.
    #[must_use]
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    async fn init_schema(&self) -> Result<(), StateError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Backend(format!("Failed to create kv_state table: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let row = sqlx::query("SELECT value FROM kv_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        row.map(|r| r.try_get::<String, _>("value"))
            .transpose()
            .map_err(|e| StateError::Backend(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        sqlx::query(
            r#"
            INSERT INTO kv_state (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Backend(e.to_string()))?;

        debug!(key, bytes = value.len(), "State key written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StateError> {
        sqlx::query("DELETE FROM kv_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{INITIALIZED_KEY, NOTES_KEY};

    #[tokio::test]
    async fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStateStore::open(dir.path().join("state.db")).await.unwrap();

        assert_eq!(store.get(NOTES_KEY).await.unwrap(), None);

        store.set(NOTES_KEY, "[]").await.unwrap();
        assert_eq!(store.get(NOTES_KEY).await.unwrap().as_deref(), Some("[]"));

        store.set(NOTES_KEY, "[1]").await.unwrap();
        assert_eq!(store.get(NOTES_KEY).await.unwrap().as_deref(), Some("[1]"));

        store.remove(NOTES_KEY).await.unwrap();
        assert_eq!(store.get(NOTES_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");

        {
            let store = SqliteStateStore::open(&path).await.unwrap();
            store.set_flag(INITIALIZED_KEY).await.unwrap();
            store.pool().close().await;
        }

        let reopened = SqliteStateStore::open(&path).await.unwrap();
        assert!(reopened.is_set(INITIALIZED_KEY).await.unwrap());
    }
}
