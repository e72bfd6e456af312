//! Embedding Provider fallback and failure containment with stub backends.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use labrank::config::ModelSpec;
use labrank::error::{RankError, Result};
use labrank::record::{Cell, Record};
use labrank::registry::QueryIntent;
use labrank::scoring::{EMBEDDING_SCALE, FieldWeights};
use labrank::{Embedder, EmbeddingProvider, Scorer};
use std::sync::{Arc, Mutex};

/// Maps the query to `[1, 0]` and every other text to `[-1, 0]`.
struct OppositeEmbedder {
    query: String,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Embedder for OppositeEmbedder {
    fn name(&self) -> &str {
        "opposite"
    }

    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        self.seen.lock().unwrap().push(text.to_owned());
        if text == self.query {
            Ok(vec![1.0, 0.0])
        } else {
            Ok(vec![-1.0, 0.0])
        }
    }
}

/// Always fails to encode.
struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn name(&self) -> &str {
        "broken"
    }

    fn embed(&mut self, _text: &str) -> Result<Vec<f32>> {
        Err(RankError::Embedding("backend crashed".into()))
    }
}

fn candidates() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new("sentence-transformers/all-MiniLM-L12-v2"),
        ModelSpec::new("sentence-transformers/all-MiniLM-L6-v2"),
    ]
}

fn intent() -> QueryIntent {
    QueryIntent {
        query: "glucose in blood".into(),
        component: "glucose".into(),
        system: "blood".into(),
    }
}

fn exact_record() -> (Vec<String>, Record) {
    let columns = vec!["LOINC_NUM".to_owned(), "COMPONENT".to_owned(), "SYSTEM".to_owned()];
    let record = Record::new(vec![
        Cell::Text("2345-7".into()),
        Cell::Text("glucose".into()),
        Cell::Text("blood".into()),
    ]);
    (columns, record)
}

#[test]
fn fallback_used_when_primary_fails() {
    let mut tried = Vec::new();
    let provider = EmbeddingProvider::initialize_with(&candidates(), 64, |spec| {
        tried.push(spec.repo_id.clone());
        if spec.repo_id.ends_with("L12-v2") {
            return Err(RankError::Model("primary unavailable".into()));
        }
        Ok(Box::new(OppositeEmbedder {
            query: "glucose in blood".into(),
            seen: Arc::default(),
        }) as Box<dyn Embedder>)
    });

    assert_eq!(tried.len(), 2);
    assert!(provider.is_available());
    assert_eq!(provider.backend_name(), Some("opposite"));
}

#[test]
fn both_candidates_failing_disables_embeddings() {
    let provider = EmbeddingProvider::initialize_with(&candidates(), 64, |spec| {
        Err(RankError::Model(format!("{} unavailable", spec.repo_id)))
    });
    assert!(!provider.is_available());
    assert!(provider.embed("glucose").is_none());

    let mut scorer = Scorer::new(FieldWeights::default(), EMBEDDING_SCALE, &provider);
    let (columns, record) = exact_record();
    let total = scorer.score(&intent(), &record, &columns);
    assert!((total - 45.0).abs() < 1e-9);
}

#[test]
fn opposite_vectors_contribute_nothing() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let provider = EmbeddingProvider::with_backend(
        Box::new(OppositeEmbedder {
            query: "glucose in blood".into(),
            seen: Arc::clone(&seen),
        }),
        64,
    );
    let mut scorer = Scorer::new(FieldWeights::default(), EMBEDDING_SCALE, &provider);
    let (columns, record) = exact_record();
    assert!(scorer.embedding_score(&intent(), &record, &columns).abs() < 1e-9);

    // The identifier is never embedded.
    let seen = seen.lock().unwrap();
    assert!(!seen.iter().any(|t| t == "2345-7"));
    assert!(seen.iter().any(|t| t == "glucose"));
}

#[test]
fn encode_failures_degrade_to_lexical_score() {
    let provider = EmbeddingProvider::with_backend(Box::new(BrokenEmbedder), 64);
    let mut scorer = Scorer::new(FieldWeights::default(), EMBEDDING_SCALE, &provider);
    let (columns, record) = exact_record();

    let total = scorer.score(&intent(), &record, &columns);
    assert!((total - 45.0).abs() < 1e-9);
    // Only the query embedding is attempted; it fails, so cells are not tried.
    assert_eq!(provider.failures(), 1);
}

#[test]
fn embedding_input_is_lowercased() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let provider = EmbeddingProvider::with_backend(
        Box::new(OppositeEmbedder {
            query: String::new(),
            seen: Arc::clone(&seen),
        }),
        0,
    );
    provider.embed("Glucose [Mass/Volume]").unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["glucose [mass/volume]"]);
}
