// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-addressed embedding cache with bounded eviction.
//!
//! The cache is the single source of truth for cached vectors and is
//! persisted as a whole (version + ordered entry list) on every mutation.
//! Loading happens lazily on first use; a missing or malformed persisted
//! snapshot starts the cache empty rather than failing.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use feedlens_core::KvStore;

/// Maximum number of cached embeddings.
pub const CACHE_CAPACITY: usize = 20;

/// KV key holding the persisted snapshot.
const CACHE_KEY: &str = "embedding_cache";

/// Snapshot format version.
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    hash: String,
    vector: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheSnapshot {
    version: u32,
    entries: Vec<CacheEntry>,
}

#[derive(Debug, Default)]
struct CacheState {
    loaded: bool,
    /// Ordered least- to most-recently remembered.
    entries: VecDeque<CacheEntry>,
}

/// Bounded, persisted, content-addressed embedding cache.
pub struct EmbeddingCache {
    kv: Arc<dyn KvStore>,
    state: Mutex<CacheState>,
}

impl EmbeddingCache {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        EmbeddingCache {
            kv,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Look up a previously computed vector by content hash.
    ///
    /// Lookups do not reorder the queue; only `remember` refreshes recency.
    pub async fn get(&self, hash: &str) -> Option<Vec<f32>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;
        state
            .entries
            .iter()
            .find(|e| e.hash == hash)
            .map(|e| e.vector.clone())
    }

    /// Insert or refresh a vector under its content hash.
    ///
    /// Re-remembering an existing hash moves it to the most-recent end
    /// rather than duplicating. Inserting beyond capacity evicts the
    /// least-recent entry. The full snapshot is written back on every call;
    /// a failed write keeps the in-memory state and logs a warning.
    pub async fn remember(&self, hash: &str, vector: Vec<f32>) {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;

        if let Some(pos) = state.entries.iter().position(|e| e.hash == hash) {
            let _ = state.entries.remove(pos);
        }
        state.entries.push_back(CacheEntry {
            hash: hash.to_string(),
            vector,
        });
        while state.entries.len() > CACHE_CAPACITY {
            if let Some(evicted) = state.entries.pop_front() {
                debug!(hash = %evicted.hash, "evicted least-recent embedding");
            }
        }

        self.persist(&state).await;
    }

    /// Current entry count (loads the snapshot if needed).
    pub async fn len(&self) -> usize {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;
        state.entries.len()
    }

    async fn ensure_loaded(&self, state: &mut CacheState) {
        if state.loaded {
            return;
        }
        state.loaded = true;

        let value = match self.kv.get_one(CACHE_KEY).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "embedding cache load failed, starting empty");
                return;
            }
        };
        let Some(value) = value else {
            debug!("no persisted embedding cache, starting empty");
            return;
        };
        match serde_json::from_value::<CacheSnapshot>(value) {
            Ok(snapshot) if snapshot.version == CACHE_VERSION => {
                let mut entries: VecDeque<CacheEntry> = snapshot.entries.into();
                while entries.len() > CACHE_CAPACITY {
                    entries.pop_front();
                }
                debug!(entries = entries.len(), "embedding cache restored");
                state.entries = entries;
            }
            Ok(snapshot) => {
                warn!(
                    version = snapshot.version,
                    "unsupported embedding cache version, starting empty"
                );
            }
            Err(e) => {
                warn!(error = %e, "malformed embedding cache snapshot, starting empty");
            }
        }
    }

    async fn persist(&self, state: &CacheState) {
        let snapshot = CacheSnapshot {
            version: CACHE_VERSION,
            entries: state.entries.iter().cloned().collect(),
        };
        let value = match serde_json::to_value(&snapshot) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "embedding cache serialization failed");
                return;
            }
        };
        if let Err(e) = self.kv.set_one(CACHE_KEY, value).await {
            warn!(error = %e, "embedding cache write failed, keeping in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedlens_test_utils::MemoryKv;

    fn vector(seed: f32) -> Vec<f32> {
        vec![seed, seed + 1.0, seed + 2.0]
    }

    #[tokio::test]
    async fn get_miss_then_remember_then_hit() {
        let kv = Arc::new(MemoryKv::new());
        let cache = EmbeddingCache::new(kv);

        assert!(cache.get("h1").await.is_none());
        cache.remember("h1", vector(1.0)).await;
        assert_eq!(cache.get("h1").await.unwrap(), vector(1.0));
    }

    #[tokio::test]
    async fn capacity_bound_evicts_least_recent() {
        let kv = Arc::new(MemoryKv::new());
        let cache = EmbeddingCache::new(kv);

        for i in 0..CACHE_CAPACITY {
            cache.remember(&format!("h{i}"), vector(i as f32)).await;
        }
        assert_eq!(cache.len().await, CACHE_CAPACITY);

        cache.remember("h-new", vector(99.0)).await;
        assert_eq!(cache.len().await, CACHE_CAPACITY);
        assert!(cache.get("h0").await.is_none(), "h0 should be evicted");
        assert!(cache.get("h1").await.is_some());
        assert!(cache.get("h-new").await.is_some());
    }

    #[tokio::test]
    async fn re_remember_refreshes_recency() {
        let kv = Arc::new(MemoryKv::new());
        let cache = EmbeddingCache::new(kv);

        for i in 0..CACHE_CAPACITY {
            cache.remember(&format!("h{i}"), vector(i as f32)).await;
        }
        // Touch h0 so h1 becomes the eviction candidate.
        cache.remember("h0", vector(0.5)).await;
        cache.remember("h-new", vector(99.0)).await;

        assert_eq!(cache.get("h0").await.unwrap(), vector(0.5));
        assert!(cache.get("h1").await.is_none(), "h1 should be evicted");
    }

    #[tokio::test]
    async fn re_remember_does_not_duplicate() {
        let kv = Arc::new(MemoryKv::new());
        let cache = EmbeddingCache::new(kv);
        cache.remember("h1", vector(1.0)).await;
        cache.remember("h1", vector(2.0)).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("h1").await.unwrap(), vector(2.0));
    }

    #[tokio::test]
    async fn snapshot_survives_reload() {
        let kv = Arc::new(MemoryKv::new());
        {
            let cache = EmbeddingCache::new(kv.clone());
            cache.remember("h1", vector(1.0)).await;
            cache.remember("h2", vector(2.0)).await;
        }
        // Fresh cache instance over the same store reconstructs from the snapshot.
        let cache = EmbeddingCache::new(kv);
        assert_eq!(cache.get("h1").await.unwrap(), vector(1.0));
        assert_eq!(cache.get("h2").await.unwrap(), vector(2.0));
    }

    #[tokio::test]
    async fn malformed_snapshot_starts_empty() {
        let kv = Arc::new(MemoryKv::new());
        kv.put_raw(CACHE_KEY, serde_json::json!({"garbage": true}))
            .await;
        let cache = EmbeddingCache::new(kv);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn unsupported_version_starts_empty() {
        let kv = Arc::new(MemoryKv::new());
        kv.put_raw(
            CACHE_KEY,
            serde_json::json!({"version": 99, "entries": [{"hash": "h", "vector": [1.0]}]}),
        )
        .await;
        let cache = EmbeddingCache::new(kv);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn write_failure_keeps_in_memory_state() {
        let kv = Arc::new(MemoryKv::new());
        let cache = EmbeddingCache::new(kv.clone());
        kv.fail_writes(true).await;
        cache.remember("h1", vector(1.0)).await;
        // The set failed but the entry is still served from memory.
        assert_eq!(cache.get("h1").await.unwrap(), vector(1.0));
    }
}
