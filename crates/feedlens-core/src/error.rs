// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Feedlens engagement engine.

use thiserror::Error;

/// The primary error type used across all Feedlens adapter traits and core operations.
///
/// Nothing in the engine propagates one of these across the public `Engine`
/// boundary; callers of internal crates handle them at the nearest component
/// seam and downgrade to a degraded-but-valid result (an "unknown"
/// classification, a skipped recommendation, best-available in-memory state).
#[derive(Debug, Error)]
pub enum FeedlensError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Key/value store errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding provider errors (model inference failure, empty output).
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Classifier model errors (missing weights file, structural mismatch).
    #[error("model error: {0}")]
    Model(String),

    /// Recommendation backend errors (API failure, empty completion).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FeedlensError {
    /// Wrap an arbitrary error as a storage failure.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        FeedlensError::Storage {
            source: Box::new(source),
        }
    }

    /// Build an embedding failure from a plain message.
    pub fn embedding(message: impl Into<String>) -> Self {
        FeedlensError::Embedding {
            message: message.into(),
            source: None,
        }
    }

    /// Build a backend failure from a plain message.
    pub fn backend(message: impl Into<String>) -> Self {
        FeedlensError::Backend {
            message: message.into(),
            source: None,
        }
    }
}
