//! Result rows and the append-only output table.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// One record scored for one query, before batch normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    /// Query text.
    pub query: String,
    /// LOINC identifier.
    pub identifier: String,
    /// Normalised long name.
    pub name: String,
    /// Normalised component.
    pub component: String,
    /// Normalised system.
    pub system: String,
    /// Normalised property.
    pub property: String,
    /// Normalised measurement type.
    pub measurement: String,
    /// Relevance score before normalisation.
    pub raw_score: f64,
}

/// One persisted row of the output table. The raw score is not kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    #[serde(rename = "Query")]
    pub query: String,
    #[serde(rename = "LOINC Code")]
    pub identifier: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Component")]
    pub component: String,
    #[serde(rename = "System")]
    pub system: String,
    #[serde(rename = "Property")]
    pub property: String,
    #[serde(rename = "Measurement")]
    pub measurement: String,
    #[serde(rename = "Normalized_Score")]
    pub normalized_score: f64,
}

impl OutputRow {
    /// Project a scored result onto the output columns.
    pub fn from_scored(result: ScoredResult, normalized_score: f64) -> Self {
        Self {
            query: result.query,
            identifier: result.identifier,
            name: result.name,
            component: result.component,
            system: result.system,
            property: result.property,
            measurement: result.measurement,
            normalized_score,
        }
    }
}

/// Append `rows` to the table at `path`, creating it (and its parent
/// directories) if needed.
///
/// The header is written only when the file is new or empty. Returns
/// `true` if the file did not exist before this call.
///
/// # Errors
///
/// Returns [`crate::error::RankError::Io`] or
/// [`crate::error::RankError::Csv`] if the table cannot be written.
pub fn append_results(path: &Path, rows: &[OutputRow]) -> Result<bool> {
    let existed = path.exists();
    let needs_header = !existed || std::fs::metadata(path)?.len() == 0;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(!existed)
}

/// Read every row of an output table.
///
/// # Errors
///
/// Returns [`crate::error::RankError::Csv`] if the table cannot be read or
/// a row does not match the output columns.
pub fn read_results(path: &Path) -> Result<Vec<OutputRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
