// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Feedlens collaborator boundaries.
//!
//! The engine consumes three external collaborators: an embedding provider,
//! a persistent key/value store, and one or more recommendation backends.
//! All three use `#[async_trait]` for dynamic dispatch compatibility.

pub mod backend;
pub mod embedding;
pub mod storage;

// Re-export all traits at the traits module level for convenience.
pub use backend::RecommendationBackend;
pub use embedding::EmbeddingProvider;
pub use storage::KvStore;
