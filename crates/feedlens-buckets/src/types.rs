// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily bucket data model and the engagement update pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use feedlens_core::types::{DayKey, DaySummary, EngagementDelta, UNKNOWN_LABEL};

/// Diagnostic embedding samples retained per bucket, oldest evicted first.
pub const MAX_EMBEDDING_SAMPLES: usize = 50;

/// Titles must be longer than this many trimmed characters to count as valid.
pub const MIN_TITLE_CHARS: usize = 5;

/// Ledger entry for a post seen within a day.
///
/// Presence of a hash in the ledger is what makes a post "already seen";
/// the rest of the fields are the audit record for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeenPost {
    pub topic: String,
    pub first_seen_ms: u64,
    pub title: String,
    pub confidence: Option<f32>,
}

/// Running classifier-confidence statistics for one topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidenceStat {
    pub sum: f64,
    pub count: u64,
    pub average: f64,
}

impl ConfidenceStat {
    /// Fold one confidence observation into the running average.
    fn observe(&mut self, confidence: f64) {
        self.sum += confidence;
        self.count += 1;
        self.average = self.sum / self.count as f64;
    }
}

/// Diagnostic snapshot of a classified event. Not used by any invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSample {
    pub domain: String,
    pub content_type: String,
    pub topic: String,
    pub hash: String,
    pub embedding: Vec<f32>,
    pub at_ms: u64,
}

/// Aggregated engagement record for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBucket {
    pub day: DayKey,
    /// Domain -> accumulated milliseconds.
    pub by_domain: BTreeMap<String, u64>,
    /// Content-type tag -> accumulated milliseconds.
    pub by_content_type: BTreeMap<String, u64>,
    /// Topic -> accumulated milliseconds.
    pub by_topic: BTreeMap<String, u64>,
    /// Topic -> count of unique posts seen with that topic.
    pub by_topic_counts: BTreeMap<String, u64>,
    /// Sum of every delta ever applied to this bucket.
    pub total_ms: u64,
    /// Content-hash -> ledger entry; doubles as the per-day dedup set.
    pub seen_posts: BTreeMap<String, SeenPost>,
    /// Topic -> running confidence statistics.
    pub lr_probabilities: BTreeMap<String, ConfidenceStat>,
    /// Recent classified-event snapshots, capped at [`MAX_EMBEDDING_SAMPLES`].
    #[serde(default)]
    pub embedding_samples: Vec<EmbeddingSample>,
}

/// Whether a title qualifies for topic attribution.
pub fn is_valid_title(title: Option<&str>) -> bool {
    title.is_some_and(|t| t.trim().chars().count() > MIN_TITLE_CHARS)
}

impl DailyBucket {
    pub fn new(day: DayKey) -> Self {
        DailyBucket {
            day,
            by_domain: BTreeMap::new(),
            by_content_type: BTreeMap::new(),
            by_topic: BTreeMap::new(),
            by_topic_counts: BTreeMap::new(),
            total_ms: 0,
            seen_posts: BTreeMap::new(),
            lr_probabilities: BTreeMap::new(),
            embedding_samples: Vec::new(),
        }
    }

    /// Apply one engagement update.
    ///
    /// Ordering matters: domain/content-type time is always credited, topic
    /// time is credited on every qualifying event, but the unique-post count
    /// and the confidence fold happen at most once per (day, hash) pair.
    pub fn apply(&mut self, delta: &EngagementDelta) {
        let domain = delta.domain.as_deref().unwrap_or(UNKNOWN_LABEL);
        let content_type = delta.content_type.as_deref().unwrap_or(UNKNOWN_LABEL);

        *self.by_domain.entry(domain.to_string()).or_default() += delta.delta_ms;
        *self
            .by_content_type
            .entry(content_type.to_string())
            .or_default() += delta.delta_ms;

        let topic = delta
            .topic
            .as_deref()
            .filter(|t| *t != UNKNOWN_LABEL)
            .filter(|_| is_valid_title(delta.title.as_deref()));

        if let Some(topic) = topic {
            *self.by_topic.entry(topic.to_string()).or_default() += delta.delta_ms;

            if let Some(hash) = delta.content_hash.as_deref() {
                if !self.seen_posts.contains_key(hash) {
                    *self.by_topic_counts.entry(topic.to_string()).or_default() += 1;
                    self.seen_posts.insert(
                        hash.to_string(),
                        SeenPost {
                            topic: topic.to_string(),
                            first_seen_ms: delta.at_ms,
                            title: delta.title.as_deref().unwrap_or_default().trim().to_string(),
                            confidence: delta.confidence,
                        },
                    );
                    if let Some(confidence) = delta.confidence {
                        self.lr_probabilities
                            .entry(topic.to_string())
                            .or_default()
                            .observe(f64::from(confidence));
                    }
                }
            }
        }

        self.total_ms += delta.delta_ms;

        if let Some(embedding) = &delta.embedding {
            self.embedding_samples.push(EmbeddingSample {
                domain: domain.to_string(),
                content_type: content_type.to_string(),
                topic: delta.topic.clone().unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                hash: delta.content_hash.clone().unwrap_or_default(),
                embedding: embedding.clone(),
                at_ms: delta.at_ms,
            });
            if self.embedding_samples.len() > MAX_EMBEDDING_SAMPLES {
                let excess = self.embedding_samples.len() - MAX_EMBEDDING_SAMPLES;
                self.embedding_samples.drain(..excess);
            }
        }
    }

    /// Titles from the seen-posts ledger that qualify as valid.
    pub fn valid_titles(&self) -> Vec<&str> {
        self.seen_posts
            .values()
            .map(|p| p.title.as_str())
            .filter(|t| is_valid_title(Some(t)))
            .collect()
    }

    /// Read-only projection for recommendation backends and UI callers.
    pub fn summarize(&self, sample_post_title: Option<String>) -> DaySummary {
        DaySummary {
            day: self.day.clone(),
            total_ms: self.total_ms,
            topic_times: self.by_topic.clone(),
            topic_counts: self.by_topic_counts.clone(),
            confidence_averages: self
                .lr_probabilities
                .iter()
                .map(|(topic, stat)| (topic.clone(), stat.average))
                .collect(),
            sample_post_title,
        }
    }
}
