// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! KV-backed bucket store with an explicit day index.
//!
//! Buckets live at `bucket/<day>`; `buckets/index` holds the sorted list of
//! live days so retention and day selection never scan the key namespace.
//! Reads happen immediately before each mutation and the full bucket is
//! written back, accepting last-writer-wins semantics.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use feedlens_core::types::{DayKey, EngagementDelta};
use feedlens_core::{FeedlensError, KvStore};

use crate::types::DailyBucket;

const INDEX_KEY: &str = "buckets/index";

fn bucket_key(day: &DayKey) -> String {
    format!("bucket/{day}")
}

/// Persistent store of daily buckets over the key/value contract.
#[derive(Clone)]
pub struct BucketStore {
    kv: Arc<dyn KvStore>,
}

impl BucketStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        BucketStore { kv }
    }

    /// Load one day's bucket. Malformed persisted records read as absent.
    pub async fn load(&self, day: &DayKey) -> Result<Option<DailyBucket>, FeedlensError> {
        let Some(value) = self.kv.get_one(&bucket_key(day)).await? else {
            return Ok(None);
        };
        match serde_json::from_value::<DailyBucket>(value) {
            Ok(bucket) => Ok(Some(bucket)),
            Err(e) => {
                warn!(day = %day, error = %e, "malformed bucket record, treating as absent");
                Ok(None)
            }
        }
    }

    /// Apply an engagement update to the given day, creating the bucket on
    /// first use, and persist the result.
    ///
    /// Persistence failures are soft: the updated bucket is still returned
    /// and the loss is logged, matching the fails-safe design of the engine.
    pub async fn apply_engagement(
        &self,
        day: &DayKey,
        delta: &EngagementDelta,
    ) -> DailyBucket {
        let mut bucket = match self.load(day).await {
            Ok(Some(bucket)) => bucket,
            Ok(None) => DailyBucket::new(day.clone()),
            Err(e) => {
                warn!(day = %day, error = %e, "bucket read failed, starting from empty state");
                DailyBucket::new(day.clone())
            }
        };

        bucket.apply(delta);
        self.persist(&bucket).await;
        bucket
    }

    /// Replace a bucket wholesale (used by the classification fold-back).
    pub async fn persist(&self, bucket: &DailyBucket) {
        let mut days = match self.days().await {
            Ok(days) => days,
            Err(e) => {
                warn!(error = %e, "bucket index read failed, rebuilding with this day only");
                Vec::new()
            }
        };
        if !days.contains(&bucket.day) {
            days.push(bucket.day.clone());
            days.sort();
        }

        let bucket_value = match serde_json::to_value(bucket) {
            Ok(v) => v,
            Err(e) => {
                warn!(day = %bucket.day, error = %e, "bucket serialization failed");
                return;
            }
        };
        let index_value = match serde_json::to_value(&days) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "bucket index serialization failed");
                return;
            }
        };

        let entries = HashMap::from([
            (bucket_key(&bucket.day), bucket_value),
            (INDEX_KEY.to_string(), index_value),
        ]);
        if let Err(e) = self.kv.set(entries).await {
            warn!(day = %bucket.day, error = %e, "bucket write failed, in-memory update kept");
        }
    }

    /// All live bucket days, sorted ascending.
    pub async fn days(&self) -> Result<Vec<DayKey>, FeedlensError> {
        let Some(value) = self.kv.get_one(INDEX_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_value::<Vec<DayKey>>(value) {
            Ok(mut days) => {
                days.sort();
                Ok(days)
            }
            Err(e) => {
                warn!(error = %e, "malformed bucket index, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// The most recent bucket strictly before `today`, if any.
    pub async fn latest_before(
        &self,
        today: &DayKey,
    ) -> Result<Option<DailyBucket>, FeedlensError> {
        let days = self.days().await?;
        for day in days.iter().rev() {
            if day < today {
                if let Some(bucket) = self.load(day).await? {
                    return Ok(Some(bucket));
                }
                debug!(day = %day, "indexed day has no bucket record, skipping");
            }
        }
        Ok(None)
    }

    /// Delete the given days and drop them from the index.
    pub async fn remove_days(&self, days: &[DayKey]) -> Result<(), FeedlensError> {
        if days.is_empty() {
            return Ok(());
        }
        let keys: Vec<String> = days.iter().map(bucket_key).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.kv.remove(&key_refs).await?;

        let remaining: Vec<DayKey> = self
            .days()
            .await?
            .into_iter()
            .filter(|d| !days.contains(d))
            .collect();
        self.kv
            .set_one(
                INDEX_KEY,
                serde_json::to_value(&remaining)
                    .map_err(|e| FeedlensError::Internal(format!("index encode: {e}")))?,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedlens_test_utils::MemoryKv;

    fn classified(ms: u64, hash: &str) -> EngagementDelta {
        EngagementDelta {
            domain: Some("example.com".into()),
            content_type: Some("post".into()),
            delta_ms: ms,
            title: Some("A sufficiently long title".into()),
            topic: Some("tech".into()),
            content_hash: Some(hash.into()),
            confidence: Some(0.8),
            at_ms: 1_000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn apply_engagement_creates_persists_and_indexes() {
        let kv = Arc::new(MemoryKv::new());
        let store = BucketStore::new(kv.clone());
        let day = DayKey::new("2026-08-06");

        let bucket = store.apply_engagement(&day, &classified(1_000, "h1")).await;
        assert_eq!(bucket.total_ms, 1_000);

        let reloaded = store.load(&day).await.unwrap().unwrap();
        assert_eq!(reloaded.total_ms, 1_000);
        assert_eq!(store.days().await.unwrap(), vec![day]);
    }

    #[tokio::test]
    async fn totals_accumulate_across_updates() {
        let kv = Arc::new(MemoryKv::new());
        let store = BucketStore::new(kv);
        let day = DayKey::new("2026-08-06");

        for ms in [1_000u64, 2_000, 3_000] {
            store.apply_engagement(&day, &classified(ms, "h1")).await;
        }
        let bucket = store.load(&day).await.unwrap().unwrap();
        assert_eq!(bucket.total_ms, 6_000);
        assert_eq!(bucket.by_topic_counts["tech"], 1);
    }

    #[tokio::test]
    async fn latest_before_prefers_most_recent_prior_day() {
        let kv = Arc::new(MemoryKv::new());
        let store = BucketStore::new(kv);
        for day in ["2026-08-01", "2026-08-03", "2026-08-06"] {
            store
                .apply_engagement(&DayKey::new(day), &classified(500, "h"))
                .await;
        }

        let today = DayKey::new("2026-08-07");
        let picked = store.latest_before(&today).await.unwrap().unwrap();
        assert_eq!(picked.day.as_str(), "2026-08-06");

        // With today present in the index, the same-day bucket is skipped.
        let picked = store
            .latest_before(&DayKey::new("2026-08-06"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked.day.as_str(), "2026-08-03");
    }

    #[tokio::test]
    async fn remove_days_drops_records_and_index_entries() {
        let kv = Arc::new(MemoryKv::new());
        let store = BucketStore::new(kv);
        for day in ["2026-08-01", "2026-08-02", "2026-08-03"] {
            store
                .apply_engagement(&DayKey::new(day), &classified(500, "h"))
                .await;
        }

        store
            .remove_days(&[DayKey::new("2026-08-01"), DayKey::new("2026-08-02")])
            .await
            .unwrap();

        assert!(store.load(&DayKey::new("2026-08-01")).await.unwrap().is_none());
        assert_eq!(store.days().await.unwrap(), vec![DayKey::new("2026-08-03")]);
    }

    #[tokio::test]
    async fn malformed_bucket_record_reads_as_absent() {
        let kv = Arc::new(MemoryKv::new());
        kv.put_raw("bucket/2026-08-06", serde_json::json!("not a bucket"))
            .await;
        let store = BucketStore::new(kv);
        assert!(store
            .load(&DayKey::new("2026-08-06"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn write_failure_still_returns_updated_bucket() {
        let kv = Arc::new(MemoryKv::new());
        let store = BucketStore::new(kv.clone());
        kv.fail_writes(true).await;

        let day = DayKey::new("2026-08-06");
        let bucket = store.apply_engagement(&day, &classified(1_000, "h1")).await;
        assert_eq!(bucket.total_ms, 1_000);
        // Nothing durable was written.
        assert!(kv.peek("bucket/2026-08-06").await.is_none());
    }
}
