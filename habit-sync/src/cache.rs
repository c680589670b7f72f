//! Local persistent key/value cache
//!
//! Anonymous sessions keep everything here; authenticated sessions only use
//! it for the daily check-in copy and as the migration source.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

use crate::error::SyncResult;

#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Stored value; `None` when the key was never written or was deleted
    async fn get(&self, key: &str) -> SyncResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> SyncResult<()>;

    async fn delete(&self, key: &str) -> SyncResult<()>;
}

/// In-memory cache for testing and development
#[derive(Debug, Default)]
pub struct InMemoryLocalCache {
    entries: DashMap<String, String>,
}

impl InMemoryLocalCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalCache for InMemoryLocalCache {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.entries.get(key).map(|value| value.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> SyncResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Configuration for the SQLite-backed cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteCacheConfig {
    /// Path to the database file; `:memory:` keeps it in process
    pub db_path: String,
    pub max_connections: u32,
    /// Whether to enable WAL mode
    pub enable_wal: bool,
}

impl Default for SqliteCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "habitshare_local.db".to_string(),
            max_connections: 5,
            enable_wal: true,
        }
    }
}

impl SqliteCacheConfig {
    pub fn in_memory() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            max_connections: 1,
            enable_wal: false,
        }
    }

    fn is_memory(&self) -> bool {
        self.db_path == ":memory:"
    }
}

/// Key/value cache in a single SQLite table
pub struct SqliteLocalCache {
    pool: SqlitePool,
}

impl SqliteLocalCache {
    pub async fn new(config: SqliteCacheConfig) -> SyncResult<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.db_path))?
            .create_if_missing(true);

        // Every connection to `:memory:` opens its own database
        let max_connections = if config.is_memory() { 1 } else { config.max_connections.max(1) };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        if config.enable_wal && !config.is_memory() {
            sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        }

        let cache = Self { pool };
        cache.initialize_schema().await?;

        tracing::debug!(db_path = %config.db_path, "local cache opened");
        Ok(cache)
    }

    async fn initialize_schema(&self) -> SyncResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_cache (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of stored keys
    pub async fn len(&self) -> SyncResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM kv_cache")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("count")?)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LocalCache for SqliteLocalCache {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_cache (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(key = %key, bytes = value.len(), "local cache entry written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> SyncResult<()> {
        sqlx::query("DELETE FROM kv_cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
