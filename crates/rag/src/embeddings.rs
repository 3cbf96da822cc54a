//! Text embeddings
//!
//! Maps transcription text to fixed-length dense vectors. The `onnx` feature
//! runs a sentence-transformer model through ONNX Runtime; the default build
//! uses a deterministic hashed bag-of-words projection so the crate works
//! without model downloads.

#[cfg(feature = "onnx")]
use ndarray::Array2;
#[cfg(feature = "onnx")]
use ort::{GraphOptimizationLevel, Session};
#[cfg(feature = "onnx")]
use tokenizers::Tokenizer;

use medisecure_config::EmbeddingConfig;

use crate::RagError;

/// Text embedder with a fixed output dimension.
pub struct Embedder {
    #[cfg(feature = "onnx")]
    session: Session,
    #[cfg(feature = "onnx")]
    tokenizer: Tokenizer,
    config: EmbeddingConfig,
}

impl Embedder {
    /// Create a new embedder
    #[cfg(feature = "onnx")]
    pub fn new(config: EmbeddingConfig) -> Result<Self, RagError> {
        let session = Session::builder()
            .map_err(|e| RagError::Model(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RagError::Model(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e| RagError::Model(e.to_string()))?
            .commit_from_file(&config.model_path)
            .map_err(|e| RagError::Model(e.to_string()))?;

        let tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| RagError::Model(e.to_string()))?;

        Ok(Self {
            session,
            tokenizer,
            config,
        })
    }

    /// Create a new embedder (hashed fallback when ONNX is disabled)
    #[cfg(not(feature = "onnx"))]
    pub fn new(config: EmbeddingConfig) -> Result<Self, RagError> {
        Ok(Self { config })
    }

    /// Embed a single text
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        #[cfg(feature = "onnx")]
        {
            let embeddings = self.embed_batch(&[text])?;
            Ok(embeddings.into_iter().next().unwrap_or_default())
        }
        #[cfg(not(feature = "onnx"))]
        {
            Ok(hashed_embedding(text, &self.config))
        }
    }

    /// Embed multiple texts
    #[cfg(feature = "onnx")]
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.config.batch_size) {
            let batch_embeddings = self.embed_batch_internal(chunk)?;
            all_embeddings.extend(batch_embeddings);
        }

        Ok(all_embeddings)
    }

    /// Embed multiple texts (hashed fallback when ONNX is disabled)
    #[cfg(not(feature = "onnx"))]
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts
            .iter()
            .map(|t| hashed_embedding(t, &self.config))
            .collect())
    }

    /// Internal batch embedding
    #[cfg(feature = "onnx")]
    fn embed_batch_internal(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        let mut input_ids = vec![0i64; batch_size * self.config.max_seq_len];
        let mut attention_mask = vec![0i64; batch_size * self.config.max_seq_len];
        let mut token_type_ids = vec![0i64; batch_size * self.config.max_seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();

            let len = ids.len().min(self.config.max_seq_len);
            let offset = i * self.config.max_seq_len;

            for j in 0..len {
                input_ids[offset + j] = ids[j] as i64;
                attention_mask[offset + j] = mask[j] as i64;
                token_type_ids[offset + j] = types[j] as i64;
            }
        }

        let input_ids = Array2::from_shape_vec((batch_size, self.config.max_seq_len), input_ids)
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        let attention_mask =
            Array2::from_shape_vec((batch_size, self.config.max_seq_len), attention_mask)
                .map_err(|e| RagError::Embedding(e.to_string()))?;

        let token_type_ids =
            Array2::from_shape_vec((batch_size, self.config.max_seq_len), token_type_ids)
                .map_err(|e| RagError::Embedding(e.to_string()))?;

        let outputs = self
            .session
            .run(
                ort::inputs![
                    "input_ids" => input_ids.view(),
                    "attention_mask" => attention_mask.view(),
                    "token_type_ids" => token_type_ids.view(),
                ]
                .map_err(|e| RagError::Model(e.to_string()))?,
            )
            .map_err(|e| RagError::Model(e.to_string()))?;

        let last_hidden = outputs
            .get(&self.config.output_name)
            .ok_or_else(|| {
                RagError::Model(format!("Missing output tensor: {}", self.config.output_name))
            })?
            .try_extract_tensor::<f32>()
            .map_err(|e| RagError::Model(e.to_string()))?;

        let hidden_view = last_hidden.view();

        let mut embeddings = Vec::with_capacity(batch_size);

        // Mean-pool over the sequence, then optionally L2-normalize.
        for i in 0..batch_size {
            let seq_len = encodings[i].get_ids().len().min(self.config.max_seq_len);
            let mut embedding = vec![0.0f32; self.config.dimension];

            for j in 0..seq_len {
                for k in 0..self.config.dimension {
                    embedding[k] += hidden_view[[i, j, k]];
                }
            }

            for v in &mut embedding {
                *v /= seq_len as f32;
            }

            if self.config.normalize {
                normalize(&mut embedding);
            }

            embeddings.push(embedding);
        }

        Ok(embeddings)
    }

    /// Get embedding dimension
    pub fn dim(&self) -> usize {
        self.config.dimension
    }
}

/// Deterministic hashed bag-of-words embedding.
///
/// Each lowercased alphanumeric token is hashed into one of `dimension`
/// buckets, so texts sharing terms land near each other under cosine
/// similarity. Stable across runs and platforms (FNV-1a), which keeps
/// persisted stores queryable.
fn hashed_embedding(text: &str, config: &EmbeddingConfig) -> Vec<f32> {
    let mut embedding = vec![0.0f32; config.dimension];

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
    {
        let idx = (fnv1a(&token.to_lowercase()) as usize) % config.dimension;
        embedding[idx] += 1.0;
    }

    if config.normalize {
        normalize(&mut embedding);
    }

    embedding
}

fn normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in embedding {
            *v /= norm;
        }
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> Embedder {
        Embedder::new(EmbeddingConfig::default()).unwrap()
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_dimension_and_norm() {
        let embedding = embedder().embed("Patient reports chest pain").unwrap();
        assert_eq!(embedding.len(), 384);

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_deterministic() {
        let e = embedder();
        assert_eq!(e.embed("chest pain").unwrap(), e.embed("chest pain").unwrap());
    }

    #[test]
    fn test_shared_terms_are_closer() {
        let e = embedder();
        let doc = e.embed("Patient reports chest pain").unwrap();
        let close = e.embed("chest pain symptoms").unwrap();
        let far = e.embed("fractured left ankle").unwrap();

        assert!(cosine(&doc, &close) > cosine(&doc, &far));
    }

    #[test]
    fn test_empty_text() {
        let embedding = embedder().embed("").unwrap();
        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|v| *v == 0.0));
    }
}
