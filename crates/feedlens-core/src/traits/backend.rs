// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recommendation backend trait for end-of-day summary generation.

use async_trait::async_trait;

use crate::error::FeedlensError;
use crate::types::DaySummary;

/// A backend that turns a day summary into human-readable recommendation text.
///
/// Backends are interchangeable and selected by configuration; the scheduler
/// attempts exactly one fallback backend when the preferred one fails or
/// returns empty output.
#[async_trait]
pub trait RecommendationBackend: Send + Sync + 'static {
    /// Human-readable backend name, used in logs and fallback reporting.
    fn name(&self) -> &str;

    /// Generate recommendation text for the given day summary.
    ///
    /// Returning an empty string is treated the same as a failure by the
    /// scheduler.
    async fn generate(&self, summary: &DaySummary) -> Result<String, FeedlensError>;
}
