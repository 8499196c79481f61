// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted mock recommendation backend.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use feedlens_core::{DaySummary, FeedlensError, RecommendationBackend};

/// One scripted response for [`MockBackend`].
#[derive(Debug, Clone)]
pub enum BackendScript {
    /// Return this text.
    Text(String),
    /// Return an empty string (treated as failure by the scheduler).
    Empty,
    /// Return a backend error.
    Fail,
}

/// Mock [`RecommendationBackend`] popping scripted responses FIFO.
///
/// When the script queue is empty, a default "mock recommendation" text is
/// returned. Received summaries are captured for assertions.
pub struct MockBackend {
    name: String,
    script: Mutex<VecDeque<BackendScript>>,
    received: Mutex<Vec<DaySummary>>,
}

impl MockBackend {
    pub fn new(name: impl Into<String>) -> Self {
        MockBackend {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(name: impl Into<String>, script: Vec<BackendScript>) -> Self {
        MockBackend {
            name: name.into(),
            script: Mutex::new(script.into()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Append a scripted response.
    pub async fn push(&self, item: BackendScript) {
        self.script.lock().await.push_back(item);
    }

    /// Summaries this backend was invoked with, in order.
    pub async fn received(&self) -> Vec<DaySummary> {
        self.received.lock().await.clone()
    }

    /// Number of `generate` invocations.
    pub async fn calls(&self) -> usize {
        self.received.lock().await.len()
    }
}

#[async_trait]
impl RecommendationBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, summary: &DaySummary) -> Result<String, FeedlensError> {
        self.received.lock().await.push(summary.clone());
        let next = self.script.lock().await.pop_front();
        match next {
            None => Ok("mock recommendation".to_string()),
            Some(BackendScript::Text(text)) => Ok(text),
            Some(BackendScript::Empty) => Ok(String::new()),
            Some(BackendScript::Fail) => Err(FeedlensError::backend("injected backend failure")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedlens_core::DayKey;
    use std::collections::BTreeMap;

    fn summary() -> DaySummary {
        DaySummary {
            day: DayKey::new("2026-08-06"),
            total_ms: 120_000,
            topic_times: BTreeMap::new(),
            topic_counts: BTreeMap::new(),
            confidence_averages: BTreeMap::new(),
            sample_post_title: None,
        }
    }

    #[tokio::test]
    async fn scripted_responses_pop_in_order() {
        let backend = MockBackend::with_script(
            "scripted",
            vec![
                BackendScript::Text("first".into()),
                BackendScript::Fail,
                BackendScript::Empty,
            ],
        );
        assert_eq!(backend.generate(&summary()).await.unwrap(), "first");
        assert!(backend.generate(&summary()).await.is_err());
        assert_eq!(backend.generate(&summary()).await.unwrap(), "");
        // Script exhausted: default text.
        assert_eq!(
            backend.generate(&summary()).await.unwrap(),
            "mock recommendation"
        );
        assert_eq!(backend.calls().await, 4);
    }
}
