// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Day rollover state machine.
//!
//! Checking -> Summarizing -> Invoking -> Recording, with retention cleanup
//! at the end of every run. The whole path is re-entrancy safe: a process
//! level mutex serializes concurrent runs FIFO, and the persisted processed
//! marker is re-read under the lock before any backend is invoked, so the
//! backend fires at most once per qualifying day.

use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use feedlens_buckets::{BucketStore, DailyBucket};
use feedlens_core::types::{DayKey, DaySummary};
use feedlens_core::KvStore;

use crate::invoker::InvokerChain;

/// Minimum engagement a bucket needs before a recommendation is attempted.
pub const MIN_SUMMARY_MS: u64 = 60_000;

/// Day most recently attempted (successfully or not). Written before any
/// backend call; this is the idempotency marker.
const PROCESSED_KEY: &str = "recommendation/last_processed_day";

/// The currently recorded recommendation.
const RECORD_KEY: &str = "recommendation/current";

/// Persisted recommendation with its frozen day summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub text: String,
    pub for_day: DayKey,
    pub summary: DaySummary,
}

/// Scheduler deciding when and with what data to invoke recommendation
/// generation, and which buckets to retire afterwards.
pub struct RolloverScheduler {
    kv: Arc<dyn KvStore>,
    buckets: BucketStore,
    invoker: InvokerChain,
    /// Serializes the Checking->Recording path; waiters are served FIFO.
    generation_lock: Mutex<()>,
}

impl RolloverScheduler {
    pub fn new(kv: Arc<dyn KvStore>, buckets: BucketStore, invoker: InvokerChain) -> Self {
        RolloverScheduler {
            kv,
            buckets,
            invoker,
            generation_lock: Mutex::new(()),
        }
    }

    /// Run one rollover check against the local clock.
    pub async fn run(&self) {
        self.run_for(&DayKey::today_local()).await;
    }

    /// Run one rollover check for an explicit "today" (deterministic variant
    /// used by tests and replay tooling).
    pub async fn run_for(&self, today: &DayKey) {
        let _guard = self.generation_lock.lock().await;

        if let Some(bucket) = self.select_bucket(today).await {
            self.summarize(today, bucket).await;
        } else {
            debug!(today = %today, "no prior-day bucket to summarize");
        }

        self.cleanup(today).await;
    }

    /// The day most recently attempted, if recorded.
    pub async fn last_processed_day(&self) -> Option<DayKey> {
        match self.kv.get_one(PROCESSED_KEY).await {
            Ok(Some(value)) => serde_json::from_value(value).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "processed marker read failed");
                None
            }
        }
    }

    /// The currently recorded recommendation, if any.
    pub async fn current_record(&self) -> Option<RecommendationRecord> {
        match self.kv.get_one(RECORD_KEY).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "malformed recommendation record");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "recommendation record read failed");
                None
            }
        }
    }

    /// Prefer yesterday's bucket; fall back to the most recent bucket
    /// strictly before today. No staleness bound is applied to the fallback.
    async fn select_bucket(&self, today: &DayKey) -> Option<DailyBucket> {
        if let Some(yesterday) = today.previous() {
            match self.buckets.load(&yesterday).await {
                Ok(Some(bucket)) => return Some(bucket),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "yesterday bucket read failed");
                    return None;
                }
            }
        }
        match self.buckets.latest_before(today).await {
            Ok(bucket) => bucket,
            Err(e) => {
                warn!(error = %e, "bucket selection failed");
                None
            }
        }
    }

    async fn summarize(&self, today: &DayKey, bucket: DailyBucket) {
        let day = bucket.day.clone();

        // Running for the current day would summarize a still-growing bucket.
        if &day >= today {
            debug!(day = %day, "selected bucket is not a prior day, skipping");
            return;
        }

        // Re-check the persisted markers under the generation lock.
        if self.last_processed_day().await.as_ref() == Some(&day) {
            debug!(day = %day, "day already processed, skipping");
            return;
        }
        if let Some(record) = self.current_record().await {
            if record.for_day == day {
                debug!(day = %day, "recommendation already recorded for day, skipping");
                return;
            }
        }

        // Mark processed as the first durable effect. If this write fails we
        // cannot guarantee at-most-once across restarts, so the attempt is
        // abandoned and a later tick retries the whole check.
        let marker = match serde_json::to_value(&day) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "processed marker encode failed");
                return;
            }
        };
        if let Err(e) = self.kv.set_one(PROCESSED_KEY, marker).await {
            warn!(day = %day, error = %e, "processed marker write failed, abandoning attempt");
            return;
        }

        if bucket.total_ms < MIN_SUMMARY_MS {
            info!(
                day = %day,
                total_ms = bucket.total_ms,
                "bucket below minimum engagement, marked processed without recommendation"
            );
            return;
        }

        let sample_title = {
            let titles = bucket.valid_titles();
            titles
                .choose(&mut rand::thread_rng())
                .map(|t| t.to_string())
        };
        let summary = bucket.summarize(sample_title);

        let Some(text) = self.invoker.generate(&summary).await else {
            info!(day = %day, "no recommendation generated, day stays processed");
            return;
        };

        let record = RecommendationRecord {
            text,
            for_day: day.clone(),
            summary,
        };
        match serde_json::to_value(&record) {
            Ok(value) => {
                if let Err(e) = self.kv.set_one(RECORD_KEY, value).await {
                    warn!(day = %day, error = %e, "recommendation record write failed");
                } else {
                    info!(day = %day, "recommendation recorded");
                }
            }
            Err(e) => warn!(error = %e, "recommendation record encode failed"),
        }
    }

    /// Retention: delete every bucket except today, the most recent
    /// still-unprocessed prior day, and the day backing the recorded
    /// recommendation.
    async fn cleanup(&self, today: &DayKey) {
        let days = match self.buckets.days().await {
            Ok(days) => days,
            Err(e) => {
                warn!(error = %e, "retention sweep skipped, index unavailable");
                return;
            }
        };

        let processed = self.last_processed_day().await;
        let record_day = self.current_record().await.map(|r| r.for_day);

        // The day awaiting summarization is the one the next check would
        // select: yesterday if its bucket exists, else the most recent prior
        // day. It is only kept while no attempt has been recorded for it.
        let candidate = match today.previous() {
            Some(yesterday) if days.contains(&yesterday) => Some(yesterday),
            _ => days.iter().rev().find(|d| *d < today).cloned(),
        };
        let pending = candidate
            .filter(|d| Some(d) != processed.as_ref() && Some(d) != record_day.as_ref());

        let stale: Vec<DayKey> = days
            .into_iter()
            .filter(|d| {
                d != today && Some(d) != pending.as_ref() && Some(d) != record_day.as_ref()
            })
            .collect();
        if stale.is_empty() {
            return;
        }

        debug!(count = stale.len(), "retiring stale buckets");
        if let Err(e) = self.buckets.remove_days(&stale).await {
            warn!(error = %e, "retention sweep failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use feedlens_core::types::EngagementDelta;
    use feedlens_test_utils::{BackendScript, MemoryKv, MockBackend};

    struct Fixture {
        kv: Arc<MemoryKv>,
        buckets: BucketStore,
        primary: Arc<MockBackend>,
        fallback: Arc<MockBackend>,
        scheduler: RolloverScheduler,
    }

    fn fixture(primary_script: Vec<BackendScript>, fallback_script: Vec<BackendScript>) -> Fixture {
        let kv = Arc::new(MemoryKv::new());
        let buckets = BucketStore::new(kv.clone());
        let primary = Arc::new(MockBackend::with_script("primary", primary_script));
        let fallback = Arc::new(MockBackend::with_script("fallback", fallback_script));
        let invoker = InvokerChain::new(vec![
            primary.clone() as Arc<dyn feedlens_core::RecommendationBackend>,
            fallback.clone(),
        ]);
        let scheduler = RolloverScheduler::new(kv.clone(), buckets.clone(), invoker);
        Fixture {
            kv,
            buckets,
            primary,
            fallback,
            scheduler,
        }
    }

    fn engagement(ms: u64, hash: &str) -> EngagementDelta {
        EngagementDelta {
            domain: Some("example.com".into()),
            content_type: Some("post".into()),
            delta_ms: ms,
            title: Some("A post title long enough".into()),
            topic: Some("technology".into()),
            content_hash: Some(hash.into()),
            confidence: Some(0.9),
            at_ms: 1_000,
            ..Default::default()
        }
    }

    async fn seed_day(f: &Fixture, day: &str, ms: u64) {
        f.buckets
            .apply_engagement(&DayKey::new(day), &engagement(ms, "h1"))
            .await;
    }

    #[tokio::test]
    async fn sufficient_bucket_generates_and_records() {
        let f = fixture(vec![BackendScript::Text("read a book".into())], vec![]);
        seed_day(&f, "2026-08-06", 120_000).await;

        f.scheduler.run_for(&DayKey::new("2026-08-07")).await;

        let record = f.scheduler.current_record().await.unwrap();
        assert_eq!(record.text, "read a book");
        assert_eq!(record.for_day.as_str(), "2026-08-06");
        assert_eq!(record.summary.total_ms, 120_000);
        assert_eq!(record.summary.topic_counts["technology"], 1);
        assert_eq!(
            record.summary.sample_post_title.as_deref(),
            Some("A post title long enough")
        );
        assert_eq!(f.primary.calls().await, 1);
        assert_eq!(
            f.scheduler.last_processed_day().await.unwrap().as_str(),
            "2026-08-06"
        );
    }

    #[tokio::test]
    async fn insufficient_bucket_marks_processed_without_record() {
        let f = fixture(vec![], vec![]);
        seed_day(&f, "2026-08-06", 30_000).await;

        f.scheduler.run_for(&DayKey::new("2026-08-07")).await;

        assert!(f.scheduler.current_record().await.is_none());
        assert_eq!(f.primary.calls().await, 0);
        assert_eq!(
            f.scheduler.last_processed_day().await.unwrap().as_str(),
            "2026-08-06"
        );
    }

    #[tokio::test]
    async fn repeated_runs_invoke_backend_once() {
        let f = fixture(
            vec![
                BackendScript::Text("first".into()),
                BackendScript::Text("should never appear".into()),
            ],
            vec![],
        );
        seed_day(&f, "2026-08-06", 120_000).await;

        let today = DayKey::new("2026-08-07");
        for _ in 0..3 {
            f.scheduler.run_for(&today).await;
        }

        assert_eq!(f.primary.calls().await, 1);
        assert_eq!(f.scheduler.current_record().await.unwrap().text, "first");
    }

    #[tokio::test]
    async fn concurrent_runs_invoke_backend_once() {
        let f = fixture(vec![BackendScript::Text("only once".into())], vec![]);
        seed_day(&f, "2026-08-06", 120_000).await;

        let today = DayKey::new("2026-08-07");
        tokio::join!(
            f.scheduler.run_for(&today),
            f.scheduler.run_for(&today),
            f.scheduler.run_for(&today)
        );

        assert_eq!(f.primary.calls().await, 1);
    }

    #[tokio::test]
    async fn primary_failure_falls_back_then_records() {
        let f = fixture(
            vec![BackendScript::Fail],
            vec![BackendScript::Text("fallback text".into())],
        );
        seed_day(&f, "2026-08-06", 90_000).await;

        f.scheduler.run_for(&DayKey::new("2026-08-07")).await;

        assert_eq!(f.primary.calls().await, 1);
        assert_eq!(f.fallback.calls().await, 1);
        assert_eq!(
            f.scheduler.current_record().await.unwrap().text,
            "fallback text"
        );
    }

    #[tokio::test]
    async fn total_failure_marks_processed_and_never_retries() {
        let f = fixture(vec![BackendScript::Fail], vec![BackendScript::Fail]);
        seed_day(&f, "2026-08-06", 90_000).await;

        let today = DayKey::new("2026-08-07");
        f.scheduler.run_for(&today).await;
        f.scheduler.run_for(&today).await;

        assert!(f.scheduler.current_record().await.is_none());
        assert_eq!(f.primary.calls().await, 1);
        assert_eq!(f.fallback.calls().await, 1);
        assert_eq!(
            f.scheduler.last_processed_day().await.unwrap().as_str(),
            "2026-08-06"
        );
    }

    #[tokio::test]
    async fn missing_yesterday_falls_back_to_most_recent_prior_day() {
        let f = fixture(vec![BackendScript::Text("stale ok".into())], vec![]);
        seed_day(&f, "2026-08-01", 120_000).await;

        f.scheduler.run_for(&DayKey::new("2026-08-07")).await;

        let record = f.scheduler.current_record().await.unwrap();
        assert_eq!(record.for_day.as_str(), "2026-08-01");
    }

    #[tokio::test]
    async fn retention_keeps_today_and_record_day_only() {
        let f = fixture(vec![BackendScript::Text("keep me".into())], vec![]);
        seed_day(&f, "2026-08-03", 10_000).await;
        seed_day(&f, "2026-08-04", 10_000).await;
        seed_day(&f, "2026-08-06", 120_000).await;
        seed_day(&f, "2026-08-07", 5_000).await;

        f.scheduler.run_for(&DayKey::new("2026-08-07")).await;

        let days = f.buckets.days().await.unwrap();
        assert_eq!(
            days,
            vec![DayKey::new("2026-08-06"), DayKey::new("2026-08-07")],
            "old buckets retired, record day and today kept"
        );
    }

    #[tokio::test]
    async fn empty_store_run_is_a_no_op() {
        let f = fixture(vec![], vec![]);
        f.scheduler.run_for(&DayKey::new("2026-08-07")).await;
        assert!(f.scheduler.last_processed_day().await.is_none());
        assert!(f.scheduler.current_record().await.is_none());
    }

    #[tokio::test]
    async fn marker_write_failure_abandons_attempt() {
        let f = fixture(vec![BackendScript::Text("never".into())], vec![]);
        seed_day(&f, "2026-08-06", 120_000).await;
        f.kv.fail_writes(true).await;

        f.scheduler.run_for(&DayKey::new("2026-08-07")).await;

        assert_eq!(f.primary.calls().await, 0);

        // Store recovers; the next tick completes the attempt.
        f.kv.fail_writes(false).await;
        f.scheduler.run_for(&DayKey::new("2026-08-07")).await;
        assert_eq!(f.primary.calls().await, 1);
    }

    #[tokio::test]
    async fn next_day_generates_again_and_replaces_record() {
        let f = fixture(
            vec![
                BackendScript::Text("for the 6th".into()),
                BackendScript::Text("for the 7th".into()),
            ],
            vec![],
        );
        seed_day(&f, "2026-08-06", 120_000).await;
        f.scheduler.run_for(&DayKey::new("2026-08-07")).await;

        seed_day(&f, "2026-08-07", 180_000).await;
        f.scheduler.run_for(&DayKey::new("2026-08-08")).await;

        let record = f.scheduler.current_record().await.unwrap();
        assert_eq!(record.text, "for the 7th");
        assert_eq!(record.for_day.as_str(), "2026-08-07");
        assert_eq!(f.primary.calls().await, 2);
    }
}
