// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recommendation backend chain with a single fallback attempt.

use std::sync::Arc;

use tracing::{info, warn};

use feedlens_core::{DaySummary, RecommendationBackend};

/// Ordered backend chain: the preferred backend first, then at most one
/// fallback. Longer chains are truncated; generation is best-effort and a
/// day is never retried once attempted.
pub struct InvokerChain {
    backends: Vec<Arc<dyn RecommendationBackend>>,
}

impl InvokerChain {
    pub fn new(backends: Vec<Arc<dyn RecommendationBackend>>) -> Self {
        InvokerChain { backends }
    }

    /// Whether any backend is configured at all.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Generate recommendation text for the summary.
    ///
    /// Tries the preferred backend; on failure or empty output tries exactly
    /// one fallback. Returns `None` when every attempt failed or came back
    /// empty.
    pub async fn generate(&self, summary: &DaySummary) -> Option<String> {
        for backend in self.backends.iter().take(2) {
            match backend.generate(summary).await {
                Ok(text) if !text.trim().is_empty() => {
                    info!(backend = backend.name(), day = %summary.day, "recommendation generated");
                    return Some(text);
                }
                Ok(_) => {
                    warn!(backend = backend.name(), "backend returned empty output");
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "backend invocation failed");
                }
            }
        }
        None
    }
}
