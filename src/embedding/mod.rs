//! Sentence embeddings for the semantic half of the relevance score.
//!
//! # Pipeline
//!
//! ```text
//! text → lowercase → cache → Embedder (ONNX) → f32 vector
//! (query vec, cell vec) → cosine ∈ [-1, 1] → (cos + 1) / 2 ∈ [0, 1]
//! ```
//!
//! Backends implement [`Embedder`]. [`EmbeddingProvider`] owns at most one
//! backend, chosen once at startup from an ordered candidate list, and turns
//! every backend failure into "no signal" (`None`).

pub mod engine;
pub mod provider;

pub use engine::OnnxEmbedder;
pub use provider::EmbeddingProvider;

use crate::error::Result;

/// A text embedding backend.
pub trait Embedder: Send {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Encode `text` into a dense vector.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails. Callers normally go through
    /// [`EmbeddingProvider::embed`], which contains the error.
    fn embed(&mut self, text: &str) -> Result<Vec<f32>>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` when either vector has zero
/// norm or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom < 1e-12 {
        return 0.0;
    }
    dot / denom
}

/// Cosine similarity mapped from `[-1, 1]` onto `[0, 1]`.
pub fn unit_similarity(a: &[f32], b: &[f32]) -> f64 {
    let sim = f64::from(cosine_similarity(a, b)).clamp(-1.0, 1.0);
    (sim + 1.0) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_identical() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_degenerate_inputs_are_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn unit_similarity_maps_range() {
        let a = [1.0, 0.0];
        assert!((unit_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(unit_similarity(&a, &[-1.0, 0.0]).abs() < 1e-6);
        assert!((unit_similarity(&a, &[0.0, 1.0]) - 0.5).abs() < 1e-6);
    }
}
