// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Linear scoring and stable softmax over a loaded classifier model.

use tracing::debug;

use feedlens_core::types::Classification;

use crate::weights::ClassifierModel;

/// Classifier wrapping a validated [`ClassifierModel`].
///
/// `classify` never fails: dimension mismatches degrade to the "unknown"
/// result instead of erroring, so a provider swap that changes embedding
/// dimensionality cannot take the aggregation pipeline down.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    model: ClassifierModel,
}

impl LinearClassifier {
    pub fn new(model: ClassifierModel) -> Self {
        LinearClassifier { model }
    }

    pub fn model(&self) -> &ClassifierModel {
        &self.model
    }

    /// Classify an embedding into a topic label with per-class probabilities.
    ///
    /// Logits accumulate in f64; softmax subtracts the max logit before
    /// exponentiating. Ties resolve to the lowest class index.
    pub fn classify(&self, embedding: &[f32]) -> Classification {
        let features = self.model.num_features();
        if embedding.len() != features {
            debug!(
                got = embedding.len(),
                expected = features,
                "embedding dimension mismatch, returning unknown"
            );
            return Classification::unknown();
        }

        let classes = self.model.num_classes();
        let weights = self.model.weights();
        let bias = self.model.bias();

        let mut logits = vec![0.0f64; classes];
        for (c, logit) in logits.iter_mut().enumerate() {
            let row = &weights[c * features..(c + 1) * features];
            let mut acc = f64::from(bias[c]);
            for (x, w) in embedding.iter().zip(row) {
                acc += f64::from(*x) * f64::from(*w);
            }
            *logit = acc;
        }

        let probabilities = stable_softmax(&logits);

        // Strict-greater scan: first occurrence wins on exact ties.
        let mut best = 0;
        for i in 1..classes {
            if probabilities[i] > probabilities[best] {
                best = i;
            }
        }

        Classification {
            label: self.model.topics()[best].clone(),
            confidence: probabilities[best] as f32,
            probabilities: probabilities.iter().map(|p| *p as f32).collect(),
        }
    }
}

/// Softmax with the max-logit subtracted before exponentiation, so large
/// logits cannot overflow `exp`.
fn stable_softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}
