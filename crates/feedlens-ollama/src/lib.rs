// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama local-model recommendation backend for Feedlens.
//!
//! Talks to a local Ollama server's `/api/generate` endpoint with
//! `stream: false`. No authentication, no retry: the scheduler's fallback
//! chain handles a dead local server.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use feedlens_config::model::OllamaConfig;
use feedlens_core::{DaySummary, FeedlensError, RecommendationBackend};

/// A non-streaming request to `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// The response from `/api/generate` with `stream: false`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama-backed recommendation generation.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Build a backend from configuration.
    pub fn from_config(config: &OllamaConfig) -> Result<Self, FeedlensError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| FeedlensError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(OllamaBackend {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl RecommendationBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, summary: &DaySummary) -> Result<String, FeedlensError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: summary.render_prompt(),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| FeedlensError::Backend {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedlensError::backend(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| FeedlensError::Backend {
                message: format!("failed to parse Ollama response: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(day = %summary.day, chars = parsed.response.len(), "ollama recommendation received");
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use feedlens_core::DayKey;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summary() -> DaySummary {
        DaySummary {
            day: DayKey::new("2026-08-06"),
            total_ms: 120_000,
            topic_times: BTreeMap::from([("technology".to_string(), 120_000)]),
            topic_counts: BTreeMap::from([("technology".to_string(), 3)]),
            confidence_averages: BTreeMap::from([("technology".to_string(), 0.85)]),
            sample_post_title: Some("New compiler released".to_string()),
        }
    }

    async fn backend_for(server: &MockServer) -> OllamaBackend {
        OllamaBackend::from_config(&OllamaConfig {
            base_url: server.uri(),
            model: "llama3.2".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn generates_with_non_streaming_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(
                serde_json::json!({"model": "llama3.2", "stream": false}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.2",
                "response": "Try reading long-form articles tomorrow.",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = backend_for(&server).await.generate(&summary()).await.unwrap();
        assert_eq!(text, "Try reading long-form articles tomorrow.");
    }

    #[tokio::test]
    async fn server_error_is_a_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = backend_for(&server).await.generate(&summary()).await.unwrap_err();
        assert!(matches!(err, FeedlensError::Backend { .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_a_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let err = backend_for(&server).await.generate(&summary()).await.unwrap_err();
        assert!(matches!(err, FeedlensError::Backend { .. }));
    }
}
