//! Delimited input files and the per-file preparation steps.
//!
//! A results download is turned into a scoreable [`Dataset`] by:
//!
//! 1. reading it (comma- or tab-delimited, ragged rows tolerated)
//! 2. standardising headers (trim, uppercase, alias renames)
//! 3. deriving `MEASUREMENT_TYPE` from the bracketed part of `NAME`
//! 4. normalising every free-text column except the identifier

use crate::config::ColumnConfig;
use crate::error::{RankError, Result};
use crate::record::{
    Cell, IDENTIFIER_COLUMN, MEASUREMENT_TYPE_COLUMN, NAME_COLUMN, Record,
};
use std::path::{Path, PathBuf};

/// An in-memory table of lab-test records.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset, padding short rows with [`Cell::Missing`] and
    /// truncating long ones to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let records = rows
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, Cell::Missing);
                Record::new(cells)
            })
            .collect();
        Self { columns, records }
    }

    /// Read a delimited file as-is. `.tsv` files are tab-delimited, anything
    /// else is comma-delimited.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Csv`] if the file cannot be opened or a row
    /// cannot be decoded.
    pub fn read(path: &Path) -> Result<Self> {
        let delimiter = if has_extension(path, "tsv") { b'\t' } else { b',' };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)?;

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        let mut rows = Vec::new();
        for row in reader.records() {
            let row = row?;
            rows.push(row.iter().map(Cell::parse).collect());
        }
        Ok(Self::new(columns, rows))
    }

    /// Read a file and run every preparation step, producing a dataset ready
    /// for scoring.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Csv`] for unreadable files and [`RankError::Data`]
    /// when no identifier column survives standardisation.
    pub fn load(path: &Path, columns: &ColumnConfig) -> Result<Self> {
        let mut dataset = Self::read(path)?;
        dataset.standardize_columns(columns);
        if dataset.column_index(IDENTIFIER_COLUMN).is_none() {
            return Err(RankError::Data(format!(
                "{} has no {IDENTIFIER_COLUMN} column",
                path.display()
            )));
        }
        dataset.derive_measurement_type();
        dataset.normalize_text_columns();
        Ok(dataset)
    }

    /// Trim and uppercase every header, then rename the first identifier and
    /// long-name aliases to [`IDENTIFIER_COLUMN`] and [`NAME_COLUMN`].
    ///
    /// An alias is left alone when its canonical column already exists.
    pub fn standardize_columns(&mut self, config: &ColumnConfig) {
        for column in &mut self.columns {
            *column = column.trim().to_uppercase();
        }
        self.rename_first_alias(&config.identifier_aliases, IDENTIFIER_COLUMN);
        self.rename_first_alias(&config.name_aliases, NAME_COLUMN);
    }

    fn rename_first_alias(&mut self, aliases: &[String], canonical: &str) {
        if self.column_index(canonical).is_some() {
            return;
        }
        let found = self.columns.iter().position(|c| {
            aliases
                .iter()
                .any(|alias| alias.trim().eq_ignore_ascii_case(c))
        });
        if let Some(idx) = found {
            tracing::debug!(from = %self.columns[idx], to = canonical, "renaming column");
            self.columns[idx] = canonical.to_owned();
        }
    }

    /// Set `MEASUREMENT_TYPE` to the first bracketed substring of `NAME`,
    /// or an empty string. Overwrites an existing column of that name.
    pub fn derive_measurement_type(&mut self) {
        let name_idx = self.column_index(NAME_COLUMN);
        let values: Vec<Cell> = self
            .records
            .iter()
            .map(|record| {
                let name = name_idx.map_or("", |idx| record.cells()[idx].as_str());
                Cell::Text(first_bracketed(name).unwrap_or_default().to_owned())
            })
            .collect();

        let target = match self.column_index(MEASUREMENT_TYPE_COLUMN) {
            Some(idx) => idx,
            None => {
                self.columns.push(MEASUREMENT_TYPE_COLUMN.to_owned());
                for record in &mut self.records {
                    record.cells_mut().push(Cell::Missing);
                }
                self.columns.len() - 1
            }
        };
        for (record, value) in self.records.iter_mut().zip(values) {
            record.cells_mut()[target] = value;
        }
    }

    /// Clean and abbreviation-expand, in place, every column holding at
    /// least one text cell. The identifier column is never touched.
    pub fn normalize_text_columns(&mut self) {
        let identifier = self.column_index(IDENTIFIER_COLUMN);
        for idx in 0..self.columns.len() {
            if Some(idx) == identifier {
                continue;
            }
            if !self.records.iter().any(|r| r.cells()[idx].is_text()) {
                continue;
            }
            for record in &mut self.records {
                let cell = &mut record.cells_mut()[idx];
                *cell = cell.normalized();
            }
        }
    }

    /// Position of `column`, if present.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records in file order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The contents of the first `[...]` pair in `text`.
pub fn first_bracketed(text: &str) -> Option<&str> {
    let start = text.find('[')? + 1;
    let len = text[start..].find(']')?;
    Some(&text[start..start + len])
}

/// List the regular files in `dir` whose extension is one of `extensions`
/// (case-insensitive), sorted by path.
///
/// # Errors
///
/// Returns [`RankError::Io`] if `dir` cannot be listed.
pub fn discover_input_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && extensions.iter().any(|ext| has_extension(&path, ext)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext.trim_start_matches('.')))
}
