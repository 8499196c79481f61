// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Production assembly: config -> collaborators -> Engine.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use feedlens_anthropic::AnthropicBackend;
use feedlens_config::FeedlensConfig;
use feedlens_core::{FeedlensError, RecommendationBackend};
use feedlens_embedding::OnnxEmbedder;
use feedlens_ollama::OllamaBackend;
use feedlens_storage::SqliteKv;

use crate::engine::Engine;

/// Initialize tracing with `RUST_LOG` taking precedence over the configured
/// level. Safe to call more than once.
pub fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Build the ordered backend chain named by the configuration.
pub fn backends_from_config(
    config: &FeedlensConfig,
) -> Result<Vec<Arc<dyn RecommendationBackend>>, FeedlensError> {
    let mut names = vec![config.recommendation.backend.as_str()];
    if let Some(fallback) = config.recommendation.fallback.as_deref() {
        names.push(fallback);
    }

    let mut chain: Vec<Arc<dyn RecommendationBackend>> = Vec::with_capacity(names.len());
    for name in names {
        let backend: Arc<dyn RecommendationBackend> = match name {
            "anthropic" => Arc::new(AnthropicBackend::from_config(&config.anthropic)?),
            "ollama" => Arc::new(OllamaBackend::from_config(&config.ollama)?),
            other => {
                return Err(FeedlensError::Config(format!(
                    "unknown recommendation backend `{other}`"
                )));
            }
        };
        chain.push(backend);
    }
    Ok(chain)
}

/// Assemble a production engine: SQLite storage, local ONNX embeddings, and
/// the configured backend chain.
pub async fn bootstrap(config: FeedlensConfig) -> Result<Engine, FeedlensError> {
    let kv = Arc::new(SqliteKv::from_config(&config.storage).await?);
    let embedder = Arc::new(OnnxEmbedder::from_dir(Path::new(&config.embedding.model_dir))?);
    let backends = backends_from_config(&config)?;
    info!(
        backend = %config.recommendation.backend,
        fallback = config.recommendation.fallback.as_deref().unwrap_or("none"),
        "feedlens engine assembled"
    );
    Ok(Engine::new(config, kv, embedder, backends))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_chain_respects_config_order() {
        let mut config = FeedlensConfig::default();
        config.recommendation.backend = "ollama".to_string();
        config.recommendation.fallback = Some("anthropic".to_string());
        config.anthropic.api_key = Some("sk-ant-test".to_string());

        let chain = backends_from_config(&config).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].name(), "ollama");
        assert_eq!(chain[1].name(), "anthropic");
    }

    #[test]
    fn missing_anthropic_key_fails_assembly() {
        let mut config = FeedlensConfig::default();
        config.recommendation.backend = "anthropic".to_string();
        assert!(backends_from_config(&config).is_err());
    }

    #[test]
    fn no_fallback_builds_single_backend_chain() {
        let config = FeedlensConfig::default();
        let chain = backends_from_config(&config).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].name(), "ollama");
    }
}
