//! SQLite-backed [`DurableStore`] implementation.
//!
//! Every cache entry is one row of `cache_entries`, keyed by its full
//! storage key. Writes are upserts, so a corrupted row is simply replaced
//! the next time its entry is written.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use care_cache_core::store::{decode_segment, key_prefix, DurableStore};

/// SQLite implementation of the [`DurableStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Entry count for one `(namespace, version)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceCount {
    pub namespace: String,
    pub version: String,
    pub entries: i64,
    pub last_write: Option<i64>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Count entries per namespace and version, sorted by namespace then
    /// version.
    pub async fn namespace_counts(&self) -> Result<Vec<NamespaceCount>> {
        let rows = sqlx::query("SELECT key, updated_at FROM cache_entries")
            .fetch_all(&self.pool)
            .await?;

        let mut counts: BTreeMap<(String, String), (i64, i64)> = BTreeMap::new();
        for row in &rows {
            let key: String = row.get("key");
            let updated_at: i64 = row.get("updated_at");
            let Some((namespace, version)) = key_prefix(&key) else {
                continue;
            };
            let entry = counts
                .entry((namespace.to_string(), decode_segment(version)))
                .or_insert((0, i64::MIN));
            entry.0 += 1;
            entry.1 = entry.1.max(updated_at);
        }

        Ok(counts
            .into_iter()
            .map(|((namespace, version), (entries, last))| NamespaceCount {
                namespace,
                version,
                entries,
                last_write: (last != i64::MIN).then_some(last),
            })
            .collect())
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM cache_entries WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
