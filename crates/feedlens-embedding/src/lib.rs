// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding pipeline pieces for Feedlens.
//!
//! - [`content_hash`]: stable SHA-256 identity for normalized text, shared by
//!   the embedding cache and the per-day post dedup ledger.
//! - [`EmbeddingCache`]: content-addressed, 20-entry, persisted-on-mutation
//!   cache in front of the embedding provider.
//! - [`OnnxEmbedder`]: local all-MiniLM-L6-v2 inference producing 384-dim
//!   L2-normalized vectors, no external API calls.

pub mod cache;
pub mod hash;
pub mod onnx;

pub use cache::EmbeddingCache;
pub use hash::{content_hash, normalize_text};
pub use onnx::{OnnxEmbedder, EMBEDDING_DIM};
