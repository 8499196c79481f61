// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Feedlens engagement pipeline.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Topic label returned when classification could not run or did not qualify.
pub const UNKNOWN_LABEL: &str = "unknown";

/// A local calendar date key in `%Y-%m-%d` form.
///
/// Lexicographic ordering of the string form equals chronological ordering,
/// which the bucket index and the rollover scheduler rely on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(String);

impl DayKey {
    /// Wrap an already-formatted `%Y-%m-%d` string.
    pub fn new(day: impl Into<String>) -> Self {
        DayKey(day.into())
    }

    /// Build a key from a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        DayKey(date.format("%Y-%m-%d").to_string())
    }

    /// Today according to the local clock.
    pub fn today_local() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse back into a calendar date. Returns `None` for malformed keys.
    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }

    /// The preceding calendar day, if this key parses.
    pub fn previous(&self) -> Option<DayKey> {
        self.to_date().and_then(|d| d.pred_opt()).map(Self::from_date)
    }
}

impl std::fmt::Display for DayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One engagement update flowing into a daily bucket.
///
/// Produced by the content-ingestion boundary; classification fields are
/// present only when the classifier ran for this event.
#[derive(Debug, Clone, Default)]
pub struct EngagementDelta {
    /// Domain the content was consumed on. Defaults to "unknown" when absent.
    pub domain: Option<String>,
    /// Content-type tag (post, video, short, ...). Defaults to "unknown".
    pub content_type: Option<String>,
    /// Engagement time to credit, in milliseconds.
    pub delta_ms: u64,
    /// Post title, if one was extracted. Only titles longer than 5 trimmed
    /// characters count as valid for topic attribution.
    pub title: Option<String>,
    /// Classified topic label, if classification ran.
    pub topic: Option<String>,
    /// Content hash identifying the post for per-day dedup.
    pub content_hash: Option<String>,
    /// Classifier confidence for the topic, if numeric.
    pub confidence: Option<f32>,
    /// Embedding snapshot for the diagnostics sample ring, if available.
    pub embedding: Option<Vec<f32>>,
    /// Event timestamp in Unix milliseconds.
    pub at_ms: u64,
}

/// Result of classifying an embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Topic label, lower-cased and trimmed.
    pub label: String,
    /// Probability of the selected label.
    pub confidence: f32,
    /// Full per-class probability vector, in model class order. Empty when
    /// the classifier degraded to "unknown".
    pub probabilities: Vec<f32>,
}

impl Classification {
    /// The degraded result used whenever classification cannot run.
    pub fn unknown() -> Self {
        Classification {
            label: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            probabilities: Vec::new(),
        }
    }

    /// Whether this is the degraded "unknown" result.
    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }
}

/// Read-only projection of a daily bucket handed to recommendation backends
/// and to UI-facing callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySummary {
    /// The day this summary describes.
    pub day: DayKey,
    /// Total engagement time for the day, in milliseconds.
    pub total_ms: u64,
    /// Per-topic engagement time, in milliseconds.
    pub topic_times: BTreeMap<String, u64>,
    /// Per-topic unique-post counts.
    pub topic_counts: BTreeMap<String, u64>,
    /// Per-topic running classifier-confidence averages.
    pub confidence_averages: BTreeMap<String, f64>,
    /// One randomly sampled valid post title, as representative context.
    pub sample_post_title: Option<String>,
}

impl DaySummary {
    /// Deterministic plain-text rendering used as the generation prompt by
    /// every recommendation backend.
    pub fn render_prompt(&self) -> String {
        let mut lines = vec![format!(
            "A user spent {} minutes consuming social content on {}.",
            self.total_ms / 60_000,
            self.day
        )];
        if !self.topic_times.is_empty() {
            lines.push("Time per topic (minutes):".to_string());
            for (topic, ms) in &self.topic_times {
                lines.push(format!("- {topic}: {}", ms / 60_000));
            }
        }
        if !self.topic_counts.is_empty() {
            lines.push("Unique posts per topic:".to_string());
            for (topic, count) in &self.topic_counts {
                let avg = self
                    .confidence_averages
                    .get(topic)
                    .map(|a| format!(" (avg confidence {a:.2})"))
                    .unwrap_or_default();
                lines.push(format!("- {topic}: {count}{avg}"));
            }
        }
        if let Some(title) = &self.sample_post_title {
            lines.push(format!("A representative post title: \"{title}\"."));
        }
        lines.push(
            "Write a short, friendly recommendation for what this user could read or do \
             tomorrow to balance their consumption."
                .to_string(),
        );
        lines.join("\n")
    }
}
