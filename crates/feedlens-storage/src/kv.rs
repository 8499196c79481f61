// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the key/value store contract.
//!
//! Values are stored as JSON text. A multi-entry `set` runs in one
//! transaction so a logical record spanning two keys (e.g. a bucket and the
//! day index) lands atomically. Across separate calls the store remains
//! last-write-wins with no optimistic concurrency check.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use feedlens_config::model::StorageConfig;
use feedlens_core::{FeedlensError, KvStore};

use crate::database::{map_tr_err, Database};

/// SQLite-backed [`KvStore`].
pub struct SqliteKv {
    db: Database,
}

impl SqliteKv {
    /// Open the store at an explicit path.
    pub async fn open(path: &Path) -> Result<Self, FeedlensError> {
        Ok(SqliteKv {
            db: Database::open(path).await?,
        })
    }

    /// Open the store at the configured database path.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, FeedlensError> {
        Self::open(Path::new(&config.database_path)).await
    }
}

fn placeholders(n: usize) -> String {
    std::iter::repeat_n("?", n).collect::<Vec<_>>().join(", ")
}

#[async_trait]
impl KvStore for SqliteKv {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, FeedlensError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let owned: Vec<String> = keys.iter().map(|k| k.to_string()).collect();

        let rows = self
            .db
            .connection()
            .call(move |conn| -> Result<Vec<(String, String)>, rusqlite::Error> {
                let sql = format!(
                    "SELECT key, value FROM kv WHERE key IN ({})",
                    placeholders(owned.len())
                );
                let mut stmt = conn.prepare(&sql)?;
                let params = rusqlite::params_from_iter(owned.iter());
                let mapped = stmt.query_map(params, |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?;
                mapped.collect()
            })
            .await
            .map_err(map_tr_err)?;

        let mut result = HashMap::with_capacity(rows.len());
        for (key, raw) in rows {
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    result.insert(key, value);
                }
                Err(e) => {
                    // A corrupt row reads as absent rather than poisoning
                    // every multi-key fetch.
                    warn!(key = %key, error = %e, "corrupt kv row skipped");
                }
            }
        }
        Ok(result)
    }

    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), FeedlensError> {
        if entries.is_empty() {
            return Ok(());
        }
        let rows: Vec<(String, String)> = entries
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();

        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO kv (key, value) VALUES (?1, ?2)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    )?;
                    for (key, value) in &rows {
                        stmt.execute(rusqlite::params![key, value])?;
                    }
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), FeedlensError> {
        if keys.is_empty() {
            return Ok(());
        }
        let owned: Vec<String> = keys.iter().map(|k| k.to_string()).collect();

        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let sql = format!("DELETE FROM kv WHERE key IN ({})", placeholders(owned.len()));
                conn.execute(&sql, rusqlite::params_from_iter(owned.iter()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn temp_store() -> (tempfile::TempDir, SqliteKv) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteKv::open(&dir.path().join("test.db")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let (_dir, store) = temp_store().await;

        store
            .set(HashMap::from([
                ("a".to_string(), json!({"n": 1})),
                ("b".to_string(), json!([1, 2, 3])),
            ]))
            .await
            .unwrap();

        let fetched = store.get(&["a", "b", "missing"]).await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched["a"], json!({"n": 1}));
        assert_eq!(fetched["b"], json!([1, 2, 3]));

        store.remove(&["a", "never-existed"]).await.unwrap();
        assert!(store.get_one("a").await.unwrap().is_none());
        assert!(store.get_one("b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn set_is_last_write_wins() {
        let (_dir, store) = temp_store().await;
        store.set_one("k", json!("first")).await.unwrap();
        store.set_one("k", json!("second")).await.unwrap();
        assert_eq!(store.get_one("k").await.unwrap().unwrap(), json!("second"));
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let store = SqliteKv::open(&path).await.unwrap();
            store.set_one("k", json!(42)).await.unwrap();
        }
        let store = SqliteKv::open(&path).await.unwrap();
        assert_eq!(store.get_one("k").await.unwrap().unwrap(), json!(42));
    }

    #[tokio::test]
    async fn empty_batches_are_no_ops() {
        let (_dir, store) = temp_store().await;
        store.set(HashMap::new()).await.unwrap();
        store.remove(&[]).await.unwrap();
        assert!(store.get(&[]).await.unwrap().is_empty());
    }
}
