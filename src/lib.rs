//! labrank: relevance labels for LOINC lab-test records.
//!
//! Scores every record of a folder of LOINC search-result downloads against
//! a fixed registry of clinical queries and appends the normalised scores to
//! a corpus used to train and evaluate listwise rankers.
//!
//! # Architecture
//!
//! ```text
//! input folder ─► Dataset (standardise, derive, normalise)
//!                    │
//!   QueryRegistry ─► Scorer ◄─ EmbeddingProvider (optional ONNX backend)
//!                    │
//!              DatasetEnhancer ─► min-max ─► dedup ─► output table
//! ```
//!
//! - **Text normalisation** lives in the `labrank-text` workspace crate
//! - **Embeddings** come from an all-MiniLM ONNX export via `ort`; any
//!   failure degrades to lexical-only scoring
//! - **Persistence** appends to a CSV table, writing the header once

pub mod config;
pub mod dataset;
pub mod embedding;
pub mod enhancer;
pub mod error;
pub mod labrank_dirs;
pub mod progress;
pub mod record;
pub mod registry;
pub mod scoring;

pub use config::RankConfig;
pub use dataset::Dataset;
pub use embedding::{Embedder, EmbeddingProvider, OnnxEmbedder};
pub use enhancer::{DatasetEnhancer, EnhanceReport, OutputRow};
pub use error::{RankError, Result};
pub use progress::{EnhanceEvent, ProgressCallback};
pub use record::{Cell, Record};
pub use registry::{QueryIntent, QueryRegistry};
pub use scoring::{FieldWeights, ScoreBreakdown, Scorer};
