// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory key/value store for deterministic tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use feedlens_core::{FeedlensError, KvStore};

#[derive(Debug, Default)]
struct KvState {
    data: HashMap<String, Value>,
    fail_reads: bool,
    fail_writes: bool,
    write_count: u64,
}

/// In-memory [`KvStore`] with failure injection.
///
/// `fail_writes`/`fail_reads` make the next operations error, modeling a
/// persistence backend going away while the engine keeps running.
#[derive(Debug, Default)]
pub struct MemoryKv {
    state: Mutex<KvState>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing failure injection.
    pub async fn put_raw(&self, key: &str, value: Value) {
        self.state.lock().await.data.insert(key.to_string(), value);
    }

    /// Read a raw value, bypassing failure injection.
    pub async fn peek(&self, key: &str) -> Option<Value> {
        self.state.lock().await.data.get(key).cloned()
    }

    pub async fn fail_reads(&self, fail: bool) {
        self.state.lock().await.fail_reads = fail;
    }

    pub async fn fail_writes(&self, fail: bool) {
        self.state.lock().await.fail_writes = fail;
    }

    /// Number of successful `set` calls, for asserting persist-on-mutation.
    pub async fn write_count(&self) -> u64 {
        self.state.lock().await.write_count
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, FeedlensError> {
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(FeedlensError::storage(std::io::Error::other(
                "injected read failure",
            )));
        }
        Ok(keys
            .iter()
            .filter_map(|k| state.data.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), FeedlensError> {
        let mut state = self.state.lock().await;
        if state.fail_writes {
            return Err(FeedlensError::storage(std::io::Error::other(
                "injected write failure",
            )));
        }
        state.data.extend(entries);
        state.write_count += 1;
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), FeedlensError> {
        let mut state = self.state.lock().await;
        if state.fail_writes {
            return Err(FeedlensError::storage(std::io::Error::other(
                "injected remove failure",
            )));
        }
        for key in keys {
            state.data.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let kv = MemoryKv::new();
        kv.set_one("a", serde_json::json!(1)).await.unwrap();
        assert_eq!(kv.get_one("a").await.unwrap(), Some(serde_json::json!(1)));
        kv.remove(&["a"]).await.unwrap();
        assert_eq!(kv.get_one("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_failures_error() {
        let kv = MemoryKv::new();
        kv.fail_writes(true).await;
        assert!(kv.set_one("a", serde_json::json!(1)).await.is_err());
        kv.fail_writes(false).await;
        kv.fail_reads(true).await;
        assert!(kv.get(&["a"]).await.is_err());
    }
}
