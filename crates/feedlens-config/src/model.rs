// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Feedlens engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Feedlens configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeedlensConfig {
    /// Engine behavior settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Classifier weights settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Local embedding model settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Recommendation backend selection.
    #[serde(default)]
    pub recommendation: RecommendationConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Ollama local-model settings.
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Engine behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between rollover scheduler ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval_secs() -> u64 {
    300
}

/// Classifier weights configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Path to the trained weights JSON document.
    #[serde(default = "default_weights_path")]
    pub weights_path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: default_weights_path(),
        }
    }
}

fn default_weights_path() -> String {
    "model_weights.json".to_string()
}

/// Local embedding model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Directory holding `model.onnx` and `tokenizer.json`.
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
        }
    }
}

fn default_model_dir() -> String {
    "models/all-MiniLM-L6-v2".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// SQLite database path.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "feedlens.db".to_string()
}

/// Recommendation backend selection.
///
/// The scheduler tries `backend` first and, on failure or empty output,
/// attempts `fallback` exactly once.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecommendationConfig {
    /// Preferred backend: "ollama" or "anthropic".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Optional fallback backend, attempted once.
    #[serde(default)]
    pub fallback: Option<String>,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            fallback: None,
        }
    }
}

fn default_backend() -> String {
    "ollama".to_string()
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// API key. Required when the anthropic backend is selected.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// API version header value.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Maximum tokens per recommendation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_anthropic_model(),
            api_version: default_api_version(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

/// Ollama local-model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Model name to generate with.
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}
