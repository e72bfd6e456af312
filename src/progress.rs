//! Progress event types for an enhancement run.
//!
//! Provides callback-based progress reporting that decouples the pipeline
//! from presentation (the CLI renders an indicatif bar, tests collect the
//! events into a `Vec`).

use std::path::PathBuf;

/// Progress events emitted by [`crate::enhancer::DatasetEnhancer::run`].
#[derive(Debug, Clone)]
pub enum EnhanceEvent {
    /// The run has discovered its inputs.
    RunStarted {
        /// Number of registered queries.
        queries: usize,
        /// Number of discovered input files.
        files: usize,
    },

    /// One (query, file) pair was scored.
    FileScored {
        /// Query text.
        query: String,
        /// Input file.
        file: PathBuf,
        /// Records scored from this file.
        rows: usize,
    },

    /// One (query, file) pair was skipped because the file was unusable.
    FileSkipped {
        /// Query text.
        query: String,
        /// Input file.
        file: PathBuf,
        /// Human-readable reason.
        reason: String,
    },

    /// Raw scores of the whole batch were rescaled to `[0, 1]`.
    ScoresNormalized {
        /// Lowest raw score in the batch.
        min: f64,
        /// Highest raw score in the batch.
        max: f64,
        /// Number of scored results.
        results: usize,
    },

    /// Deduplicated results were appended to the output table.
    ResultsPersisted {
        /// Output table.
        path: PathBuf,
        /// Rows written.
        rows: usize,
        /// Whether the output table was created by this run.
        created: bool,
    },
}

/// Callback type for receiving progress events.
pub type ProgressCallback = Box<dyn Fn(EnhanceEvent) + Send + Sync>;
