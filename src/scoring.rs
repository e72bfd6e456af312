//! Relevance scoring of one record against one query intent.
//!
//! The score is the sum of two independent sub-scores:
//!
//! ```text
//! traditional = Σ over {COMPONENT, SYSTEM}:
//!                 w²        if query value == record value
//!                 0.5 · w²  if query value is a substring of record value
//!                 0         otherwise
//!
//! embedding   = Σ over weighted text columns:
//!                 ((cos(q, cell) + 1) / 2) · scale · w
//! ```
//!
//! There is no per-record upper bound; the enhancer rescales the whole
//! batch afterwards.

use crate::config::ScoringConfig;
use crate::embedding::{EmbeddingProvider, unit_similarity};
use crate::record::{COMPONENT_COLUMN, IDENTIFIER_COLUMN, Record, SYSTEM_COLUMN};
use crate::registry::QueryIntent;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Multiplier applied to each `[0, 1]` embedding similarity.
pub const EMBEDDING_SCALE: f64 = 5.0;

/// Weight for columns not listed in the weight table.
pub const DEFAULT_FIELD_WEIGHT: f64 = 0.5;

/// The built-in per-column weight table.
pub fn default_field_weights() -> BTreeMap<String, f64> {
    [
        (COMPONENT_COLUMN, 6.0),
        (SYSTEM_COLUMN, 3.0),
        ("NAME", 2.0),
        ("PROPERTY", 1.5),
        ("MEASUREMENT_TYPE", 1.0),
        ("METHOD_TYP", 1.0),
        ("SCALE_TYP", 0.5),
        ("TIME_ASPCT", 0.5),
        ("EXAMPLE_UNITS", 0.5),
        ("STATUS", 0.1),
        (IDENTIFIER_COLUMN, 0.0),
    ]
    .into_iter()
    .map(|(column, weight)| (column.to_owned(), weight))
    .collect()
}

/// Per-column weights with a fallback for unlisted columns.
#[derive(Debug, Clone)]
pub struct FieldWeights {
    weights: BTreeMap<String, f64>,
    default_weight: f64,
}

impl FieldWeights {
    /// Build a weight table.
    pub fn new(weights: BTreeMap<String, f64>, default_weight: f64) -> Self {
        Self {
            weights,
            default_weight,
        }
    }

    /// Weight of `column`. The identifier column is always 0.
    pub fn weight(&self, column: &str) -> f64 {
        if column == IDENTIFIER_COLUMN {
            return 0.0;
        }
        self.weights
            .get(column)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self::new(default_field_weights(), DEFAULT_FIELD_WEIGHT)
    }
}

impl From<&ScoringConfig> for FieldWeights {
    fn from(config: &ScoringConfig) -> Self {
        Self::new(config.weights.clone(), config.default_weight)
    }
}

/// The parts of one record's score, kept in debug mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// The record's identifier.
    pub identifier: String,
    /// Lexical sub-score.
    pub traditional: f64,
    /// Embedding sub-score.
    pub embedding: f64,
    /// `traditional + embedding`.
    pub total: f64,
}

/// Scores records against query intents.
///
/// Borrows the embedding provider; a disabled provider makes every
/// embedding sub-score 0. The query vector is encoded once per intent and
/// reused for every record scored against it.
pub struct Scorer<'a> {
    weights: FieldWeights,
    scale: f64,
    provider: &'a EmbeddingProvider,
    query_vec: Option<(String, Option<Arc<Vec<f32>>>)>,
    debug: bool,
    breakdowns: Vec<ScoreBreakdown>,
}

impl<'a> Scorer<'a> {
    /// Create a scorer with explicit weights and embedding scale.
    pub fn new(weights: FieldWeights, scale: f64, provider: &'a EmbeddingProvider) -> Self {
        Self {
            weights,
            scale,
            provider,
            query_vec: None,
            debug: false,
            breakdowns: Vec::new(),
        }
    }

    /// Create a scorer from the `[scoring]` configuration section.
    pub fn from_config(config: &ScoringConfig, provider: &'a EmbeddingProvider) -> Self {
        Self::new(FieldWeights::from(config), config.embedding_scale, provider).with_debug(config.debug)
    }

    /// Keep a [`ScoreBreakdown`] for every scored record.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Lexical sub-score: exact or substring matches on component and system.
    pub fn traditional_score(&self, intent: &QueryIntent, record: &Record, columns: &[String]) -> f64 {
        let component = record.field(columns, COMPONENT_COLUMN).to_lowercase();
        let system = record.field(columns, SYSTEM_COLUMN).to_lowercase();
        match_score(&intent.component, &component, self.weights.weight(COMPONENT_COLUMN))
            + match_score(&intent.system, &system, self.weights.weight(SYSTEM_COLUMN))
    }

    /// Embedding sub-score over every weighted, non-empty text column.
    pub fn embedding_score(&mut self, intent: &QueryIntent, record: &Record, columns: &[String]) -> f64 {
        let Some(query_vec) = self.query_vector(intent) else {
            return 0.0;
        };

        let mut total = 0.0;
        for (column, cell) in columns.iter().zip(record.cells()) {
            let weight = self.weights.weight(column);
            if weight == 0.0 || !cell.is_text() || cell.as_str().trim().is_empty() {
                continue;
            }
            if let Some(cell_vec) = self.provider.embed(cell.as_str()) {
                total += unit_similarity(&query_vec, &cell_vec) * self.scale * weight;
            }
        }
        total
    }

    /// Combined relevance score of `record` for `intent`.
    pub fn score(&mut self, intent: &QueryIntent, record: &Record, columns: &[String]) -> f64 {
        let traditional = self.traditional_score(intent, record, columns);
        let embedding = self.embedding_score(intent, record, columns);
        let total = traditional + embedding;

        if self.debug {
            let identifier = record.field(columns, IDENTIFIER_COLUMN).to_owned();
            debug!(
                query = %intent.query,
                identifier = %identifier,
                traditional,
                embedding,
                total,
                "score breakdown"
            );
            self.breakdowns.push(ScoreBreakdown {
                identifier,
                traditional,
                embedding,
                total,
            });
        }
        total
    }

    /// Encoded query of `intent`. A failed encode is remembered too, so the
    /// whole intent degrades to the lexical score.
    fn query_vector(&mut self, intent: &QueryIntent) -> Option<Arc<Vec<f32>>> {
        match &self.query_vec {
            Some((query, vector)) if *query == intent.query => vector.clone(),
            _ => {
                let vector = self.provider.embed(&intent.query);
                self.query_vec = Some((intent.query.clone(), vector.clone()));
                vector
            }
        }
    }

    /// Drain the breakdowns recorded so far.
    pub fn take_breakdowns(&mut self) -> Vec<ScoreBreakdown> {
        std::mem::take(&mut self.breakdowns)
    }
}

fn match_score(expected: &str, actual: &str, weight: f64) -> f64 {
    if expected == actual {
        weight * weight
    } else if actual.contains(expected) {
        0.5 * weight * weight
    } else {
        0.0
    }
}
