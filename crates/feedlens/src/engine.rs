// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Engine facade: the public boundary of the core.
//!
//! Nothing here returns an error to callers. Degraded outcomes (an unloaded
//! model, a failed embedding, a dead store) surface as "unknown"
//! classifications, absent summaries, or skipped recommendations, which the
//! UI treats as normal displayable states.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use feedlens_buckets::{BucketStore, DailyBucket};
use feedlens_classifier::{ClassifierModel, LinearClassifier};
use feedlens_config::FeedlensConfig;
use feedlens_core::types::{Classification, DayKey, DaySummary, EngagementDelta};
use feedlens_core::{EmbeddingProvider, KvStore, RecommendationBackend};
use feedlens_embedding::{content_hash, normalize_text, EmbeddingCache};
use feedlens_scheduler::{InvokerChain, RolloverScheduler};

/// The engagement engine: one instance per process, single logical worker.
///
/// All state mutation flows through this object; the only suspension points
/// are the key/value store, the embedding provider, and the recommendation
/// backends.
pub struct Engine {
    config: FeedlensConfig,
    buckets: BucketStore,
    cache: EmbeddingCache,
    embedder: Arc<dyn EmbeddingProvider>,
    /// Lazily loaded classifier. The cell memoizes a failed load as `None`
    /// so concurrent callers share one load and the process never retries.
    classifier: OnceCell<Option<Arc<LinearClassifier>>>,
    scheduler: RolloverScheduler,
}

impl Engine {
    /// Assemble an engine from its collaborators. Backends are ordered:
    /// preferred first, then at most one fallback.
    pub fn new(
        config: FeedlensConfig,
        kv: Arc<dyn KvStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        backends: Vec<Arc<dyn RecommendationBackend>>,
    ) -> Self {
        let buckets = BucketStore::new(kv.clone());
        let scheduler =
            RolloverScheduler::new(kv.clone(), buckets.clone(), InvokerChain::new(backends));
        Engine {
            config,
            buckets,
            cache: EmbeddingCache::new(kv),
            embedder,
            classifier: OnceCell::new(),
            scheduler,
        }
    }

    /// Record an engagement update into today's bucket and return the
    /// updated bucket.
    pub async fn record_engagement(&self, delta: EngagementDelta) -> DailyBucket {
        self.record_engagement_for(&DayKey::today_local(), delta)
            .await
    }

    /// Record an engagement update into an explicit day's bucket
    /// (deterministic variant used by tests and backfill tooling).
    pub async fn record_engagement_for(
        &self,
        day: &DayKey,
        mut delta: EngagementDelta,
    ) -> DailyBucket {
        if delta.at_ms == 0 {
            delta.at_ms = chrono::Utc::now().timestamp_millis() as u64;
        }
        self.buckets.apply_engagement(day, &delta).await
    }

    /// Classify a text snippet: cache lookup, provider call on miss, then
    /// linear classification. Never fails; every degraded path returns the
    /// "unknown" result.
    pub async fn classify(&self, text: &str) -> Classification {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Classification::unknown();
        }

        let Some(classifier) = self.classifier().await else {
            return Classification::unknown();
        };

        let hash = content_hash(text);
        let vector = match self.cache.get(&hash).await {
            Some(vector) => vector,
            None => match self.embedder.embed(&normalized).await {
                Ok(vector) if !vector.is_empty() => {
                    self.cache.remember(&hash, vector.clone()).await;
                    vector
                }
                Ok(_) => {
                    warn!("embedding provider returned an empty vector");
                    return Classification::unknown();
                }
                Err(e) => {
                    warn!(error = %e, "embedding failed, classification degraded");
                    return Classification::unknown();
                }
            },
        };

        classifier.classify(&vector)
    }

    /// Whether the classifier model is loaded (triggers the lazy load).
    pub async fn is_classifier_loaded(&self) -> bool {
        self.classifier().await.is_some()
    }

    /// Read view of one day's aggregation.
    pub async fn get_summary(&self, day: &DayKey) -> Option<DaySummary> {
        match self.buckets.load(day).await {
            Ok(bucket) => bucket.map(|b| b.summarize(None)),
            Err(e) => {
                warn!(day = %day, error = %e, "summary read failed");
                None
            }
        }
    }

    /// Yesterday's summary: the live bucket when it still exists, otherwise
    /// the frozen snapshot from the recorded recommendation.
    pub async fn get_previous_day_summary(&self) -> Option<DaySummary> {
        self.previous_day_summary_for(&DayKey::today_local()).await
    }

    /// Deterministic variant of [`Engine::get_previous_day_summary`].
    pub async fn previous_day_summary_for(&self, today: &DayKey) -> Option<DaySummary> {
        if let Some(yesterday) = today.previous() {
            if let Some(summary) = self.get_summary(&yesterday).await {
                return Some(summary);
            }
        }
        self.scheduler.current_record().await.map(|r| r.summary)
    }

    /// The currently recorded recommendation, if any.
    pub async fn current_recommendation(&self) -> Option<feedlens_scheduler::RecommendationRecord> {
        self.scheduler.current_record().await
    }

    /// Run one rollover check: summarize the prior day at most once and
    /// retire stale buckets. Idempotent, safe to call repeatedly and
    /// concurrently.
    pub async fn check_and_maybe_generate_recommendations(&self) {
        self.scheduler.run().await;
    }

    /// Deterministic variant of
    /// [`Engine::check_and_maybe_generate_recommendations`].
    pub async fn check_for_day(&self, today: &DayKey) {
        self.scheduler.run_for(today).await;
    }

    /// Drive the rollover check on the configured interval. Runs until the
    /// owning task is dropped or aborted. Multiple loops on one engine are
    /// safe: the scheduler single-flights concurrent checks.
    pub async fn run_scheduler_loop(&self) {
        let period =
            std::time::Duration::from_secs(self.config.engine.tick_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            self.check_and_maybe_generate_recommendations().await;
        }
    }

    async fn classifier(&self) -> Option<Arc<LinearClassifier>> {
        self.classifier
            .get_or_init(|| async {
                let path = Path::new(&self.config.model.weights_path);
                match ClassifierModel::load(path).await {
                    Ok(model) => {
                        debug!(classes = model.num_classes(), "classifier ready");
                        Some(Arc::new(LinearClassifier::new(model)))
                    }
                    Err(e) => {
                        warn!(error = %e, "classifier load failed, all classification degrades to unknown");
                        None
                    }
                }
            })
            .await
            .clone()
    }
}
