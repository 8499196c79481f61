// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider trait for semantic vector generation.

use async_trait::async_trait;

use crate::error::FeedlensError;

/// Provider turning normalized text into a fixed-length numeric vector.
///
/// Implementations must be deterministic for identical normalized input
/// (modulo floating rounding) so the content-addressed embedding cache
/// stays meaningful.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + 'static {
    /// Human-readable provider name, used in logs.
    fn name(&self) -> &str;

    /// Embed a single text snippet.
    ///
    /// An empty output vector is a provider bug and is treated as a failure
    /// by callers.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, FeedlensError>;
}
