// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic mock embedding provider.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use feedlens_core::{EmbeddingProvider, FeedlensError};

/// Mock [`EmbeddingProvider`] deriving a stable vector from the input bytes.
///
/// Identical text always embeds identically, which the cache tests rely on.
/// `fail_next` injects a one-shot provider failure.
pub struct MockEmbedder {
    dims: usize,
    calls: AtomicU64,
    fail_next: AtomicBool,
}

impl MockEmbedder {
    /// Default 8-dimensional embedder.
    pub fn new() -> Self {
        Self::with_dims(8)
    }

    pub fn with_dims(dims: usize) -> Self {
        MockEmbedder {
            dims,
            calls: AtomicU64::new(0),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Make the next `embed` call fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of `embed` calls served (including failures).
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, FeedlensError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(FeedlensError::embedding("injected provider failure"));
        }

        // Fold the bytes into each dimension so distinct texts get distinct,
        // reproducible vectors.
        let mut vector = vec![0.0f32; self.dims];
        for (i, b) in text.bytes().enumerate() {
            let slot = i % self.dims;
            vector[slot] += f32::from(b) / 255.0;
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_text_embeds_identically() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed("hello world").await.unwrap();
        let b = embedder.embed("hello world").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert_eq!(embedder.calls(), 2);
    }

    #[tokio::test]
    async fn fail_next_is_one_shot() {
        let embedder = MockEmbedder::new();
        embedder.fail_next();
        assert!(embedder.embed("x").await.is_err());
        assert!(embedder.embed("x").await.is_ok());
    }
}
