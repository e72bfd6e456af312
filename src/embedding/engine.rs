//! ONNX sentence encoder for the MiniLM family.
//!
//! Model files are downloaded from HuggingFace Hub on first use and cached
//! by `hf-hub`.
//!
//! # Pipeline
//!
//! ```text
//! text → tokenizer → ONNX model → mean-pool → L2-normalize → f32 vector
//! ```

use crate::config::ModelSpec;
use crate::embedding::Embedder;
use crate::error::{RankError, Result};
use ort::session::{Session, SessionInputValue, SessionInputs};
use ort::value::Tensor;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Sentence embedding backend running a BERT-style ONNX export.
///
/// `embed` requires `&mut self` because ONNX sessions need exclusive access
/// during inference; [`crate::embedding::EmbeddingProvider`] wraps it in a
/// `Mutex` for shared use.
pub struct OnnxEmbedder {
    name: String,
    session: Session,
    tokenizer: tokenizers::Tokenizer,
}

impl std::fmt::Debug for OnnxEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbedder")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbedder {
    /// Load an embedder from pre-downloaded model files.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Model`] if the ONNX model or tokenizer cannot be loaded.
    pub fn new(name: &str, model_path: &Path, tokenizer_path: &Path, max_tokens: usize) -> Result<Self> {
        info!("loading embedding ONNX model: {}", model_path.display());
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(2))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| RankError::Model(format!("embedding model load failed: {e}")))?;

        let mut tokenizer = tokenizers::Tokenizer::from_file(tokenizer_path)
            .map_err(|e| RankError::Model(format!("embedding tokenizer load failed: {e}")))?;

        // Long LOINC names must not exceed the model's position table.
        let truncation = tokenizers::TruncationParams {
            max_length: max_tokens,
            ..Default::default()
        };
        tokenizer
            .with_truncation(Some(truncation))
            .map_err(|e| RankError::Model(format!("tokenizer truncation config failed: {e}")))?;
        tokenizer.with_padding(None);

        info!(model = name, "embedding backend ready");
        Ok(Self {
            name: name.to_owned(),
            session,
            tokenizer,
        })
    }

    /// Download the files named by `spec` into `cache_dir`.
    ///
    /// Returns `(model_path, tokenizer_path)`. Files already in the cache
    /// are not downloaded again.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Model`] if the download fails.
    pub fn download_model(spec: &ModelSpec, cache_dir: &Path) -> Result<(PathBuf, PathBuf)> {
        info!("fetching embedding model: {}", spec.repo_id);
        let api = hf_hub::api::sync::ApiBuilder::new()
            .with_cache_dir(cache_dir.to_path_buf())
            .build()
            .map_err(|e| RankError::Model(format!("HF Hub API init failed: {e}")))?;
        let repo = api.model(spec.repo_id.clone());

        let model_path = repo.get(&spec.model_file).map_err(|e| {
            RankError::Model(format!("failed to download {}: {e}", spec.model_file))
        })?;
        let tokenizer_path = repo.get(&spec.tokenizer_file).map_err(|e| {
            RankError::Model(format!("failed to download {}: {e}", spec.tokenizer_file))
        })?;

        Ok((model_path, tokenizer_path))
    }

    /// Download (if needed) and load the model described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error if download or loading fails.
    pub fn load(spec: &ModelSpec, cache_dir: &Path, max_tokens: usize) -> Result<Self> {
        let (model_path, tokenizer_path) = Self::download_model(spec, cache_dir)?;
        Self::new(&spec.repo_id, &model_path, &tokenizer_path, max_tokens)
    }
}

impl Embedder for OnnxEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| RankError::Embedding(format!("tokenization failed: {e}")))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();
        let token_type_ids: Vec<i64> = encoding
            .get_type_ids()
            .iter()
            .map(|&t| i64::from(t))
            .collect();

        let seq_len = input_ids.len();
        if seq_len == 0 {
            return Err(RankError::Embedding("tokenizer produced no tokens".into()));
        }

        let ids_tensor = Tensor::from_array(([1, seq_len], input_ids))
            .map_err(|e| RankError::Embedding(format!("input_ids tensor failed: {e}")))?;
        let mask_tensor = Tensor::from_array(([1, seq_len], attention_mask.clone()))
            .map_err(|e| RankError::Embedding(format!("attention_mask tensor failed: {e}")))?;
        let type_tensor = Tensor::from_array(([1, seq_len], token_type_ids))
            .map_err(|e| RankError::Embedding(format!("token_type_ids tensor failed: {e}")))?;

        let mut feed: HashMap<String, SessionInputValue> = HashMap::new();
        feed.insert("input_ids".to_owned(), ids_tensor.into());
        feed.insert("attention_mask".to_owned(), mask_tensor.into());
        feed.insert("token_type_ids".to_owned(), type_tensor.into());

        let outputs = self
            .session
            .run(SessionInputs::from(feed))
            .map_err(|e| RankError::Embedding(format!("ONNX inference failed: {e}")))?;

        // [1, seq_len, hidden]
        let (_shape, data) = outputs[0_usize]
            .try_extract_tensor::<f32>()
            .map_err(|e| RankError::Embedding(format!("failed to extract output tensor: {e}")))?;

        if data.is_empty() || data.len() % seq_len != 0 {
            return Err(RankError::Embedding(format!(
                "unexpected output size {} for {seq_len} tokens",
                data.len()
            )));
        }
        let dim = data.len() / seq_len;

        Ok(l2_normalize(&mean_pool(data, &attention_mask, dim)))
    }
}

/// Mean-pool token embeddings using attention mask.
///
/// `flat` is shape `[mask.len(), dim]` stored row-major.
fn mean_pool(flat: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut count = 0.0f32;

    for (t, &m) in mask.iter().enumerate() {
        if m != 0 {
            let offset = t * dim;
            for (p, &f) in pooled.iter_mut().zip(&flat[offset..offset + dim]) {
                *p += f;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for p in &mut pooled {
            *p /= count;
        }
    }

    pooled
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm < 1e-12 {
        return vec.to_vec();
    }
    vec.iter().map(|x| x / norm).collect()
}
