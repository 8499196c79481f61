// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RecommendationBackend implementation over the Anthropic client.

use async_trait::async_trait;
use tracing::debug;

use feedlens_config::model::AnthropicConfig;
use feedlens_core::{DaySummary, FeedlensError, RecommendationBackend};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Anthropic-backed recommendation generation.
pub struct AnthropicBackend {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    /// Build a backend from configuration. Fails when no API key is set.
    pub fn from_config(config: &AnthropicConfig) -> Result<Self, FeedlensError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| FeedlensError::Config("anthropic.api_key is not set".into()))?;
        Ok(AnthropicBackend {
            client: AnthropicClient::new(api_key, &config.api_version)?,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl RecommendationBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, summary: &DaySummary) -> Result<String, FeedlensError> {
        let request = MessageRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage::user(summary.render_prompt())],
            max_tokens: self.max_tokens,
        };
        let response = self.client.complete_message(&request).await?;
        let text = response.text();
        debug!(day = %summary.day, chars = text.len(), "anthropic recommendation received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_requires_api_key() {
        let config = AnthropicConfig::default();
        assert!(AnthropicBackend::from_config(&config).is_err());

        let config = AnthropicConfig {
            api_key: Some("sk-ant-test".to_string()),
            ..AnthropicConfig::default()
        };
        let backend = AnthropicBackend::from_config(&config).unwrap();
        assert_eq!(backend.name(), "anthropic");
    }
}
