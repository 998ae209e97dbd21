//! Settings repository trait and implementation
//!
//! The settings table is a flat key/value store. Each reconciliation pass
//! reads the keys it needs once at start and builds an immutable settings
//! value object from them; nothing holds a live view of this table.

use crate::error::Result;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use std::collections::HashMap;

/// Settings repository interface
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Read a single setting
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a setting
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Read every setting as a key/value map
    async fn all(&self) -> Result<HashMap<String, String>>;

    /// Remove a setting
    ///
    /// # Returns
    /// - `Ok(true)` if the key existed
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// SQLite implementation of SettingsRepository
pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    /// Create a new SQLite settings repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        query(
            r#"
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn all(&self) -> Result<HashMap<String, String>> {
        let rows: Vec<(String, String)> = query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
