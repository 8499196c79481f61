// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feedlens: engagement aggregation and topic classification engine.
//!
//! Tracks content consumption, classifies viewed items into topics with an
//! on-device logistic-regression model over sentence embeddings, aggregates
//! per-day buckets, and generates one end-of-day recommendation through an
//! LLM backend with a single fallback attempt.
//!
//! ## Architecture
//!
//! - **Engine**: the public boundary wiring everything below
//! - **EmbeddingCache / OnnxEmbedder**: content-addressed vectors (feedlens-embedding)
//! - **LinearClassifier**: stable-softmax topic inference (feedlens-classifier)
//! - **BucketStore**: daily aggregation model (feedlens-buckets)
//! - **RolloverScheduler**: at-most-once daily summarization (feedlens-scheduler)
//! - **SqliteKv**: the persistent key/value backend (feedlens-storage)

pub mod engine;
pub mod setup;

pub use engine::Engine;
pub use setup::{backends_from_config, bootstrap, init_tracing};

// Re-export the pieces callers compose with.
pub use feedlens_config::FeedlensConfig;
pub use feedlens_core::{
    Classification, DayKey, DaySummary, EmbeddingProvider, EngagementDelta, FeedlensError,
    KvStore, RecommendationBackend,
};
pub use feedlens_embedding::content_hash;
pub use feedlens_scheduler::RecommendationRecord;
