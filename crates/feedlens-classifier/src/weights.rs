// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifier weights resource parsing and validation.
//!
//! The weights document is produced by the offline trainer:
//! `{weights: number[][], bias: number[], classes: string[]}` with optional
//! `num_classes`/`num_features` overrides. Extra fields (e.g. `label_to_id`)
//! are ignored. Any structural mismatch is a load failure; the model is never
//! partially loaded.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use feedlens_core::FeedlensError;

/// Raw weights document as exported by the trainer.
#[derive(Debug, Deserialize)]
struct WeightsDoc {
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    classes: Vec<String>,
    #[serde(default)]
    num_classes: Option<usize>,
    #[serde(default)]
    num_features: Option<usize>,
}

/// Validated, immutable classifier model.
///
/// Weights are stored flattened row-major: `weights[c * num_features + d]`
/// is the coefficient of feature `d` for class `c`.
#[derive(Debug, Clone)]
pub struct ClassifierModel {
    weights: Vec<f32>,
    bias: Vec<f32>,
    topics: Vec<String>,
    num_features: usize,
    num_classes: usize,
}

/// Normalize a topic label: trimmed, lower-cased.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

impl ClassifierModel {
    /// Parse and validate a weights document from its JSON text.
    pub fn from_json(raw: &str) -> Result<Self, FeedlensError> {
        let doc: WeightsDoc = serde_json::from_str(raw)
            .map_err(|e| FeedlensError::Model(format!("malformed weights document: {e}")))?;

        let num_classes = doc.num_classes.unwrap_or(doc.classes.len());
        if num_classes == 0 {
            return Err(FeedlensError::Model("model declares zero classes".into()));
        }
        if doc.classes.len() != num_classes {
            return Err(FeedlensError::Model(format!(
                "classes length {} does not match num_classes {num_classes}",
                doc.classes.len()
            )));
        }
        if doc.bias.len() != num_classes {
            return Err(FeedlensError::Model(format!(
                "bias length {} does not match num_classes {num_classes}",
                doc.bias.len()
            )));
        }
        if doc.weights.len() != num_classes {
            return Err(FeedlensError::Model(format!(
                "weights row count {} does not match num_classes {num_classes}",
                doc.weights.len()
            )));
        }

        let num_features = doc
            .num_features
            .unwrap_or_else(|| doc.weights[0].len());
        if num_features == 0 {
            return Err(FeedlensError::Model("model declares zero features".into()));
        }
        for (idx, row) in doc.weights.iter().enumerate() {
            if row.len() != num_features {
                return Err(FeedlensError::Model(format!(
                    "weights row {idx} has {} entries, expected {num_features}",
                    row.len()
                )));
            }
        }

        let mut weights = Vec::with_capacity(num_classes * num_features);
        for row in &doc.weights {
            weights.extend_from_slice(row);
        }

        let topics = doc.classes.iter().map(|c| normalize_label(c)).collect();

        Ok(ClassifierModel {
            weights,
            bias: doc.bias,
            topics,
            num_features,
            num_classes,
        })
    }

    /// Load and validate a weights file from disk.
    pub async fn load(path: &Path) -> Result<Self, FeedlensError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            FeedlensError::Model(format!("cannot read weights file {}: {e}", path.display()))
        })?;
        let model = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            classes = model.num_classes,
            features = model.num_features,
            "classifier model loaded"
        );
        Ok(model)
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Class labels in model order, normalized.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Flattened row-major weight matrix.
    pub(crate) fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub(crate) fn bias(&self) -> &[f32] {
        &self.bias
    }
}
