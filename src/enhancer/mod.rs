//! Dataset Enhancer: scores every input file for every registered query
//! and appends the normalised, deduplicated results to the output table.
//!
//! # Pipeline
//!
//! 1. Discover input files in the configured folder
//! 2. For each query, for each file: load (standardise, derive, normalise)
//!    and score every record. Unusable files are logged and skipped
//! 3. Rescale raw scores across the whole batch onto `[0, 1]`
//! 4. Deduplicate by identifier within each query group
//! 5. Append to the output table (header only when the table is new)
//!
//! Nothing is written when the batch is empty.

pub mod dedup;
pub mod normalize;
pub mod output;

pub use dedup::deduplicate;
pub use normalize::{normalize_scores, score_range};
pub use output::{OutputRow, ScoredResult, append_results, read_results};

use crate::config::RankConfig;
use crate::dataset::{Dataset, discover_input_files};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::progress::{EnhanceEvent, ProgressCallback};
use crate::record::{
    COMPONENT_COLUMN, IDENTIFIER_COLUMN, MEASUREMENT_TYPE_COLUMN, NAME_COLUMN, PROPERTY_COLUMN,
    SYSTEM_COLUMN,
};
use crate::registry::{QueryIntent, QueryRegistry};
use crate::scoring::{ScoreBreakdown, Scorer};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A (query, file) pair that could not be scored.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    /// Query being processed.
    pub query: String,
    /// Offending input file.
    pub file: PathBuf,
    /// Why the file was skipped.
    pub reason: String,
}

/// Outcome of one [`DatasetEnhancer::run`].
#[derive(Debug, Clone, Default)]
pub struct EnhanceReport {
    /// (query, file) pairs scored successfully.
    pub files_scored: usize,
    /// (query, file) pairs skipped.
    pub skipped: Vec<SkippedFile>,
    /// Results scored before deduplication.
    pub results_scored: usize,
    /// Rows appended to the output table.
    pub results_written: usize,
    /// Whether this run created the output table.
    pub output_created: bool,
    /// Embedding calls that failed and contributed nothing.
    pub embedding_failures: usize,
}

/// Score every record of `dataset` for `intent`.
pub fn score_dataset(scorer: &mut Scorer<'_>, intent: &QueryIntent, dataset: &Dataset) -> Vec<ScoredResult> {
    let columns = dataset.columns();
    dataset
        .records()
        .iter()
        .map(|record| {
            let raw_score = scorer.score(intent, record, columns);
            let field = |column: &str| record.field(columns, column).to_owned();
            ScoredResult {
                query: intent.query.clone(),
                identifier: field(IDENTIFIER_COLUMN),
                name: field(NAME_COLUMN),
                component: field(COMPONENT_COLUMN),
                system: field(SYSTEM_COLUMN),
                property: field(PROPERTY_COLUMN),
                measurement: field(MEASUREMENT_TYPE_COLUMN),
                raw_score,
            }
        })
        .collect()
}

/// Drives one enhancement run.
pub struct DatasetEnhancer<'a> {
    config: RankConfig,
    registry: QueryRegistry,
    provider: &'a EmbeddingProvider,
    progress: Option<ProgressCallback>,
}

impl<'a> DatasetEnhancer<'a> {
    /// Create an enhancer. `registry` is normally `config.registry()?`.
    pub fn new(config: RankConfig, registry: QueryRegistry, provider: &'a EmbeddingProvider) -> Self {
        Self {
            config,
            registry,
            provider,
            progress: None,
        }
    }

    /// Report progress through `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn emit(&self, event: EnhanceEvent) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }

    /// Execute the whole pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RankError::Io`] if the input folder cannot be
    /// listed, and an I/O or CSV error if the output table cannot be
    /// written. Unusable input files are skipped, not errors.
    pub fn run(&self) -> Result<EnhanceReport> {
        let files = discover_input_files(&self.config.input.dir, &self.config.input.extensions)?;
        info!(
            queries = self.registry.len(),
            files = files.len(),
            dir = %self.config.input.dir.display(),
            "starting enhancement run"
        );
        self.emit(EnhanceEvent::RunStarted {
            queries: self.registry.len(),
            files: files.len(),
        });

        let mut report = EnhanceReport::default();
        let mut scorer = Scorer::from_config(&self.config.scoring, self.provider);
        let mut scored: Vec<ScoredResult> = Vec::new();

        for intent in self.registry.iter() {
            for file in &files {
                match Dataset::load(file, &self.config.columns) {
                    Ok(dataset) => {
                        let results = score_dataset(&mut scorer, intent, &dataset);
                        debug!(query = %intent.query, file = %file.display(), rows = results.len(), "file scored");
                        report.files_scored += 1;
                        self.emit(EnhanceEvent::FileScored {
                            query: intent.query.clone(),
                            file: file.clone(),
                            rows: results.len(),
                        });
                        scored.extend(results);
                    }
                    Err(e) => {
                        warn!(query = %intent.query, file = %file.display(), error = %e, "skipping input file");
                        let reason = e.to_string();
                        self.emit(EnhanceEvent::FileSkipped {
                            query: intent.query.clone(),
                            file: file.clone(),
                            reason: reason.clone(),
                        });
                        report.skipped.push(SkippedFile {
                            query: intent.query.clone(),
                            file: file.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        report.results_scored = scored.len();
        report.embedding_failures = self.provider.failures();

        let Some((min, max)) = score_range(&scored) else {
            info!("no results scored; output table left untouched");
            return Ok(report);
        };
        let normalized = normalize_scores(scored);
        self.emit(EnhanceEvent::ScoresNormalized {
            min,
            max,
            results: normalized.len(),
        });

        let rows = deduplicate(normalized);
        let path = &self.config.output.path;
        report.output_created = append_results(path, &rows)?;
        report.results_written = rows.len();
        info!(
            path = %path.display(),
            rows = rows.len(),
            created = report.output_created,
            "results appended"
        );
        self.emit(EnhanceEvent::ResultsPersisted {
            path: path.clone(),
            rows: rows.len(),
            created: report.output_created,
        });

        Ok(report)
    }

    /// Score one file for one query with breakdowns enabled, highest total
    /// first. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RankError::UnknownQuery`] for an unregistered
    /// query, or the load error for an unusable file.
    pub fn explain(&self, query: &str, file: &Path) -> Result<Vec<ScoreBreakdown>> {
        let intent = self.registry.lookup(query)?;
        let dataset = Dataset::load(file, &self.config.columns)?;
        let mut scorer = Scorer::from_config(&self.config.scoring, self.provider).with_debug(true);
        score_dataset(&mut scorer, intent, &dataset);
        let mut breakdowns = scorer.take_breakdowns();
        breakdowns.sort_by(|a, b| b.total.total_cmp(&a.total));
        Ok(breakdowns)
    }
}
