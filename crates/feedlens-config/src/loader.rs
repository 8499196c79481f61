// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./feedlens.toml` >
//! `~/.config/feedlens/feedlens.toml` > `/etc/feedlens/feedlens.toml`
//! with environment variable overrides via the `FEEDLENS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FeedlensConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/feedlens/feedlens.toml` (system-wide)
/// 3. `~/.config/feedlens/feedlens.toml` (user XDG config)
/// 4. `./feedlens.toml` (local directory)
/// 5. `FEEDLENS_*` environment variables
pub fn load_config() -> Result<FeedlensConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FeedlensConfig::default()))
        .merge(Toml::file("/etc/feedlens/feedlens.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("feedlens/feedlens.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("feedlens.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<FeedlensConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FeedlensConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FeedlensConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FeedlensConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Sections recognized by the environment variable mapper.
const SECTIONS: &[&str] = &[
    "engine",
    "model",
    "embedding",
    "storage",
    "recommendation",
    "anthropic",
    "ollama",
];

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `FEEDLENS_MODEL_WEIGHTS_PATH` must map
/// to `model.weights_path`, not `model.weights.path`. Only the leading
/// section name is converted to a dot.
fn env_provider() -> Env {
    Env::prefixed("FEEDLENS_").map(|key| {
        let key_str = key.as_str();
        for section in SECTIONS {
            if let Some(rest) = key_str.strip_prefix(&format!("{section}_")) {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}
