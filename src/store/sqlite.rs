// SPDX-License-Identifier: PMPL-1.0-or-later
//! SQLite backend: the collection lives in one row of a key/value table

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

use super::StorageBackend;
use crate::error::{Error, Result};

/// Key the report collection is stored under
pub const STORAGE_KEY: &str = "accessibility-reports";

/// SQLite-backed store
pub struct SqliteBackend {
    database_url: String,
    pool: Option<Pool<Sqlite>>,
}

impl SqliteBackend {
    /// Create a backend for `database_url`; nothing is opened until [`StorageBackend::open`]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: None,
        }
    }

    fn pool(&self) -> Result<&Pool<Sqlite>> {
        self.pool
            .as_ref()
            .ok_or_else(|| Error::Storage("SQLite store is not open".to_string()))
    }

    async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn open(&mut self) -> Result<()> {
        let options = SqliteConnectOptions::from_str(&self.database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;
        self.pool = Some(pool);

        tracing::debug!(url = %self.database_url, "Opened SQLite store");
        Ok(())
    }

    async fn read(&self) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(STORAGE_KEY)
            .fetch_optional(self.pool()?)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn write(&self, payload: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(STORAGE_KEY)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool()?)
        .await?;

        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(STORAGE_KEY)
            .execute(self.pool()?)
            .await?;

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("reports.db").display());

        let mut backend = SqliteBackend::new(&url);
        backend.open().await.unwrap();
        assert_eq!(backend.read().await.unwrap(), None);

        backend.write("[\"a\"]").await.unwrap();
        backend.write("[\"b\"]").await.unwrap();
        assert_eq!(backend.read().await.unwrap().as_deref(), Some("[\"b\"]"));
        backend.close().await.unwrap();

        // Data survives reopening
        let mut reopened = SqliteBackend::new(&url);
        reopened.open().await.unwrap();
        assert_eq!(reopened.read().await.unwrap().as_deref(), Some("[\"b\"]"));
        reopened.remove().await.unwrap();
        assert_eq!(reopened.read().await.unwrap(), None);
        reopened.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unopened_backend_errors() {
        let backend = SqliteBackend::new("sqlite::memory:");
        assert!(matches!(backend.read().await, Err(Error::Storage(_))));
    }
}
