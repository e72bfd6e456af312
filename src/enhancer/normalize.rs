//! Batch-wide min-max rescaling of raw scores.

use super::output::{OutputRow, ScoredResult};

/// Lowest and highest raw score in `results`, or `None` when empty.
pub fn score_range(results: &[ScoredResult]) -> Option<(f64, f64)> {
    results.iter().map(|r| r.raw_score).fold(None, |range, score| {
        Some(match range {
            None => (score, score),
            Some((min, max)) => (min.min(score), max.max(score)),
        })
    })
}

/// Rescale raw scores across the whole batch (every query together) onto
/// `[0, 1]` and drop them from the projection.
///
/// ```text
/// normalized = (raw - min) / (max - min)
/// ```
///
/// When every raw score is equal the batch is degenerate and every row gets
/// `1.0`.
pub fn normalize_scores(results: Vec<ScoredResult>) -> Vec<OutputRow> {
    let Some((min, max)) = score_range(&results) else {
        return Vec::new();
    };
    let span = max - min;
    results
        .into_iter()
        .map(|result| {
            let normalized = if span > 0.0 {
                ((result.raw_score - min) / span).clamp(0.0, 1.0)
            } else {
                1.0
            };
            OutputRow::from_scored(result, normalized)
        })
        .collect()
}
