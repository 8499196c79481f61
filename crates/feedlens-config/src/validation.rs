// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as known backend names and required credentials.

use crate::diagnostic::ConfigError;
use crate::model::FeedlensConfig;

/// Backend names the scheduler knows how to construct.
pub const KNOWN_BACKENDS: &[&str] = &["ollama", "anthropic"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FeedlensConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !KNOWN_BACKENDS.contains(&config.recommendation.backend.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "recommendation.backend `{}` is not known (expected one of: {})",
                config.recommendation.backend,
                KNOWN_BACKENDS.join(", ")
            ),
        });
    }

    if let Some(fallback) = &config.recommendation.fallback {
        if !KNOWN_BACKENDS.contains(&fallback.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "recommendation.fallback `{fallback}` is not known (expected one of: {})",
                    KNOWN_BACKENDS.join(", ")
                ),
            });
        }
        if fallback == &config.recommendation.backend {
            errors.push(ConfigError::Validation {
                message: "recommendation.fallback must differ from recommendation.backend"
                    .to_string(),
            });
        }
    }

    // The anthropic backend cannot run without a key.
    let uses_anthropic = config.recommendation.backend == "anthropic"
        || config.recommendation.fallback.as_deref() == Some("anthropic");
    if uses_anthropic
        && config
            .anthropic
            .api_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
    {
        errors.push(ConfigError::Validation {
            message: "anthropic.api_key is required when the anthropic backend is selected"
                .to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.model.weights_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "model.weights_path must not be empty".to_string(),
        });
    }

    if config.engine.tick_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.tick_interval_secs must be at least 1".to_string(),
        });
    }

    if config.anthropic.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "anthropic.max_tokens must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&FeedlensConfig::default()).is_ok());
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = FeedlensConfig::default();
        config.recommendation.backend = "gpt9".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("gpt9"));
    }

    #[test]
    fn anthropic_backend_requires_api_key() {
        let mut config = FeedlensConfig::default();
        config.recommendation.backend = "anthropic".to_string();
        config.recommendation.fallback = Some("ollama".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("api_key")));

        config.anthropic.api_key = Some("sk-ant-test".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn fallback_must_differ_from_primary() {
        let mut config = FeedlensConfig::default();
        config.recommendation.fallback = Some("ollama".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("differ")));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = FeedlensConfig::default();
        config.storage.database_path = "  ".to_string();
        config.engine.tick_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
