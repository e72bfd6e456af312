//! Configuration types for the scoring pipeline.

use crate::error::{RankError, Result};
use crate::registry::{QueryEntry, QueryRegistry, default_entries};
use crate::scoring::{DEFAULT_FIELD_WEIGHT, EMBEDDING_SCALE, default_field_weights};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration for a labrank run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Where the per-query result downloads live.
    pub input: InputConfig,
    /// Where the scored corpus is appended.
    pub output: OutputConfig,
    /// Column standardisation rules.
    pub columns: ColumnConfig,
    /// Field weights and scoring constants.
    pub scoring: ScoringConfig,
    /// Embedding backend selection.
    pub embedding: EmbeddingConfig,
    /// Query Registry entries.
    pub queries: Vec<QueryEntry>,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            columns: ColumnConfig::default(),
            scoring: ScoringConfig::default(),
            embedding: EmbeddingConfig::default(),
            queries: default_entries(),
        }
    }
}

/// Input folder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Folder scanned for delimited input files.
    pub dir: PathBuf,
    /// File extensions (case-insensitive, without the dot) treated as input.
    pub extensions: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/loinc"),
            extensions: vec!["csv".to_owned(), "tsv".to_owned()],
        }
    }
}

/// Output table configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output table. Appended to when it exists, created otherwise.
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/loinc_enhanced.csv"),
        }
    }
}

/// Header aliases mapped onto the canonical column names.
///
/// Aliases are compared after headers are trimmed and uppercased.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Headers renamed to `LOINC_NUM`.
    pub identifier_aliases: Vec<String>,
    /// Headers renamed to `NAME`.
    pub name_aliases: Vec<String>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            identifier_aliases: ["LOINC #", "LOINC", "LOINC CODE", "LOINC_CODE", "LOINC NUM"]
                .map(str::to_owned)
                .to_vec(),
            name_aliases: ["LONG_COMMON_NAME", "LONG COMMON NAME", "LONG NAME"]
                .map(str::to_owned)
                .to_vec(),
        }
    }
}

/// Scoring weights and constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Per-column weight, keyed by standardised column name.
    pub weights: BTreeMap<String, f64>,
    /// Weight for columns missing from `weights`.
    pub default_weight: f64,
    /// Multiplier applied to each `[0, 1]` embedding similarity.
    pub embedding_scale: f64,
    /// Record per-record score breakdowns.
    pub debug: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: default_field_weights(),
            default_weight: DEFAULT_FIELD_WEIGHT,
            embedding_scale: EMBEDDING_SCALE,
            debug: false,
        }
    }
}

/// One candidate embedding model on HuggingFace Hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Repository id, e.g. `sentence-transformers/all-MiniLM-L6-v2`.
    pub repo_id: String,
    /// ONNX model path inside the repo.
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Tokenizer path inside the repo.
    #[serde(default = "default_tokenizer_file")]
    pub tokenizer_file: String,
}

impl ModelSpec {
    /// A model using the standard `onnx/model.onnx` + `tokenizer.json` layout.
    pub fn new(repo_id: &str) -> Self {
        Self {
            repo_id: repo_id.to_owned(),
            model_file: default_model_file(),
            tokenizer_file: default_tokenizer_file(),
        }
    }
}

fn default_model_file() -> String {
    "onnx/model.onnx".to_owned()
}

fn default_tokenizer_file() -> String {
    "tokenizer.json".to_owned()
}

/// Embedding backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Master switch. When off, only the lexical sub-score is used.
    pub enabled: bool,
    /// Candidate models, tried in order; the first that loads is used.
    pub models: Vec<ModelSpec>,
    /// Token truncation length.
    pub max_tokens: usize,
    /// Number of cached text embeddings (0 disables the cache).
    pub cache_capacity: u64,
    /// Model download directory. Defaults to [`crate::labrank_dirs::models_dir`].
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            models: vec![
                ModelSpec::new("sentence-transformers/all-MiniLM-L12-v2"),
                ModelSpec::new("sentence-transformers/all-MiniLM-L6-v2"),
            ],
            max_tokens: 256,
            cache_capacity: 50_000,
            cache_dir: None,
        }
    }
}

impl RankConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| RankError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RankError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path (see [`crate::labrank_dirs::config_file`]).
    pub fn default_config_path() -> PathBuf {
        crate::labrank_dirs::config_file()
    }

    /// Build the Query Registry described by `queries`.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Config`] if any entry is invalid.
    pub fn registry(&self) -> Result<QueryRegistry> {
        QueryRegistry::from_entries(&self.queries)
    }

    /// Validates this configuration eagerly, before any file is read.
    ///
    /// Checks:
    /// - every weight and `default_weight` is finite and non-negative
    /// - `embedding_scale` is finite and greater than 0
    /// - at least one input extension is configured
    /// - an enabled embedding backend lists at least one model and `max_tokens > 0`
    /// - the Query Registry entries are valid
    pub fn validate(&self) -> Result<()> {
        for (column, weight) in &self.scoring.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(RankError::Config(format!(
                    "weight for {column} must be a non-negative number"
                )));
            }
        }
        if !self.scoring.default_weight.is_finite() || self.scoring.default_weight < 0.0 {
            return Err(RankError::Config(
                "default_weight must be a non-negative number".into(),
            ));
        }
        if !self.scoring.embedding_scale.is_finite() || self.scoring.embedding_scale <= 0.0 {
            return Err(RankError::Config(
                "embedding_scale must be greater than 0".into(),
            ));
        }
        if self.input.extensions.is_empty() {
            return Err(RankError::Config(
                "at least one input extension must be configured".into(),
            ));
        }
        if self.embedding.enabled {
            if self.embedding.models.is_empty() {
                return Err(RankError::Config(
                    "embedding is enabled but no models are configured".into(),
                ));
            }
            if self.embedding.max_tokens == 0 {
                return Err(RankError::Config(
                    "embedding max_tokens must be greater than 0".into(),
                ));
            }
        }
        self.registry().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RankConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.queries.len(), 3);
        assert!((config.scoring.embedding_scale - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.embedding.models.len(), 2);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = RankConfig::default();
        config.scoring.default_weight = 0.25;
        config.embedding.enabled = false;
        config.output.path = PathBuf::from("/data/out.csv");

        config.save_to_file(&path).unwrap();
        assert!(path.exists());

        let loaded = RankConfig::from_file(&path).unwrap();
        assert!((loaded.scoring.default_weight - 0.25).abs() < f64::EPSILON);
        assert!(!loaded.embedding.enabled);
        assert_eq!(loaded.output.path, PathBuf::from("/data/out.csv"));
        assert_eq!(loaded.queries, config.queries);
        assert_eq!(loaded.scoring.weights, config.scoring.weights);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let toml_str = r#"
[output]
path = "scored.csv"

[[queries]]
query = "sodium in serum"
component = "sodium"
system = "serum"
"#;
        let config: RankConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.path, PathBuf::from("scored.csv"));
        assert_eq!(config.queries.len(), 1);
        assert_eq!(config.input.extensions, vec!["csv", "tsv"]);
        assert!(config.embedding.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn model_spec_defaults_file_names() {
        let toml_str = r#"
[embedding]
models = [{ repo_id = "org/model" }]
"#;
        let config: RankConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.embedding.models, vec![ModelSpec::new("org/model")]);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = RankConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(RankError::Io(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(matches!(
            RankConfig::from_file(&path),
            Err(RankError::Config(_))
        ));
    }

    #[test]
    fn negative_weight_rejected() {
        let mut config = RankConfig::default();
        config.scoring.weights.insert("COMPONENT".into(), -1.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("COMPONENT"));
    }

    #[test]
    fn zero_embedding_scale_rejected() {
        let mut config = RankConfig::default();
        config.scoring.embedding_scale = 0.0;
        assert!(config.validate().unwrap_err().to_string().contains("embedding_scale"));
    }

    #[test]
    fn empty_extensions_rejected() {
        let mut config = RankConfig::default();
        config.input.extensions.clear();
        assert!(config.validate().unwrap_err().to_string().contains("extension"));
    }

    #[test]
    fn enabled_embedding_without_models_rejected() {
        let mut config = RankConfig::default();
        config.embedding.models.clear();
        assert!(config.validate().is_err());
        config.embedding.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_registry_entry_rejected() {
        let mut config = RankConfig::default();
        config.queries.push(QueryEntry {
            query: "Glucose In Blood".into(),
            component: "glucose".into(),
            system: "blood".into(),
        });
        assert!(matches!(config.validate(), Err(RankError::Config(_))));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = RankConfig::default_config_path();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
