// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local ONNX embedding provider using all-MiniLM-L6-v2.
//!
//! Produces 384-dimensional L2-normalized embeddings on CPU. This is the
//! production [`EmbeddingProvider`]; tests use the deterministic mock from
//! feedlens-test-utils instead.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use tracing::debug;

use feedlens_core::{EmbeddingProvider, FeedlensError};

/// Embedding dimensions for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

fn embed_err(message: impl Into<String>) -> FeedlensError {
    FeedlensError::Embedding {
        message: message.into(),
        source: None,
    }
}

/// Tokenized input ready for the transformer.
struct EncodedText {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

/// ONNX-based embedding provider.
///
/// Loads `model.onnx` and `tokenizer.json` from a model directory. Inference
/// runs single-threaded on CPU; the session lives behind a `Mutex` because
/// `ort` sessions take `&mut self` to run.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// Safety: the session is only ever driven through the Mutex, and the
// tokenizer is thread-safe for encoding.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

impl OnnxEmbedder {
    /// Create an embedder from a directory holding `model.onnx` and
    /// `tokenizer.json`.
    pub fn from_dir(model_dir: &Path) -> Result<Self, FeedlensError> {
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            embed_err(format!(
                "failed to load tokenizer {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let model_path = model_dir.join("model.onnx");
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(&model_path))
            .map_err(|e| {
                embed_err(format!(
                    "failed to load ONNX model {}: {e}",
                    model_path.display()
                ))
            })?;

        Ok(OnnxEmbedder {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn encode(&self, text: &str) -> Result<EncodedText, FeedlensError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| embed_err(format!("tokenization failed: {e}")))?;
        Ok(EncodedText {
            input_ids: encoding.get_ids().iter().map(|&v| v as i64).collect(),
            attention_mask: encoding
                .get_attention_mask()
                .iter()
                .map(|&v| v as i64)
                .collect(),
            token_type_ids: encoding.get_type_ids().iter().map(|&v| v as i64).collect(),
        })
    }

    fn infer(&self, encoded: &EncodedText) -> Result<Vec<f32>, FeedlensError> {
        let seq_len = encoded.input_ids.len();
        if seq_len == 0 {
            return Err(embed_err("tokenizer produced no tokens"));
        }

        let to_tensor = |data: &[i64]| {
            Array2::from_shape_vec((1, seq_len), data.to_vec())
                .map_err(|e| embed_err(format!("bad tensor shape: {e}")))
        };
        let input_ids = to_tensor(&encoded.input_ids)?;
        let attention_mask = to_tensor(&encoded.attention_mask)?;
        let token_type_ids = to_tensor(&encoded.token_type_ids)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| embed_err(format!("session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => TensorRef::from_array_view(&input_ids)
                    .map_err(|e| embed_err(format!("input_ids tensor: {e}")))?,
                "attention_mask" => TensorRef::from_array_view(&attention_mask)
                    .map_err(|e| embed_err(format!("attention_mask tensor: {e}")))?,
                "token_type_ids" => TensorRef::from_array_view(&token_type_ids)
                    .map_err(|e| embed_err(format!("token_type_ids tensor: {e}")))?,
            ])
            .map_err(|e| embed_err(format!("inference failed: {e}")))?;

        // Output shape: [1, seq_len, hidden].
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| embed_err(format!("output extraction failed: {e}")))?;
        let hidden = shape[shape.len() - 1] as usize;

        let mut pooled = masked_mean(data, &encoded.attention_mask, hidden);
        l2_normalize_in_place(&mut pooled);
        debug!(dims = pooled.len(), "embedded text");
        Ok(pooled)
    }
}

/// Attention-masked mean pooling over per-token embeddings.
fn masked_mean(token_embeddings: &[f32], attention_mask: &[i64], hidden: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden];
    let mut kept = 0u32;
    for (row, keep) in token_embeddings.chunks_exact(hidden).zip(attention_mask) {
        if *keep == 0 {
            continue;
        }
        for (acc, v) in pooled.iter_mut().zip(row) {
            *acc += v;
        }
        kept += 1;
    }
    if kept > 0 {
        let inv = 1.0 / kept as f32;
        for v in &mut pooled {
            *v *= inv;
        }
    }
    pooled
}

/// Scale a vector to unit length. Zero vectors are left untouched.
fn l2_normalize_in_place(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    fn name(&self) -> &str {
        "onnx-minilm"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, FeedlensError> {
        let encoded = self.encode(text)?;
        let vector = self.infer(&encoded)?;
        if vector.is_empty() {
            return Err(embed_err("provider produced an empty vector"));
        }
        Ok(vector)
    }
}
