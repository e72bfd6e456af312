//! Lab-test records and their cells.

/// Opaque LOINC identifier column. Never normalised, weighted zero.
pub const IDENTIFIER_COLUMN: &str = "LOINC_NUM";
/// Long descriptive name column.
pub const NAME_COLUMN: &str = "NAME";
/// LOINC component (analyte) column.
pub const COMPONENT_COLUMN: &str = "COMPONENT";
/// LOINC system (specimen) column.
pub const SYSTEM_COLUMN: &str = "SYSTEM";
/// LOINC property column.
pub const PROPERTY_COLUMN: &str = "PROPERTY";
/// Measurement type derived from the bracketed part of the name.
pub const MEASUREMENT_TYPE_COLUMN: &str = "MEASUREMENT_TYPE";

/// A single cell of a delimited input file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Free text.
    Text(String),
    /// A numeric literal, kept verbatim.
    Number(String),
    /// Empty or `NaN`.
    Missing,
}

impl Cell {
    /// Classify a raw field.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(trimmed.to_owned()),
            _ => Self::Text(raw.to_owned()),
        }
    }

    /// The cell as written: text, numeric literal, or `""` when missing.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Number(s) => s,
            Self::Missing => "",
        }
    }

    /// Returns `true` for [`Cell::Text`].
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Cleaned text of this cell; non-text cells clean to an empty string.
    pub fn cleaned(&self) -> String {
        match self {
            Self::Text(s) => labrank_text::clean(s),
            Self::Number(_) | Self::Missing => String::new(),
        }
    }

    /// Abbreviation-expanded cell; non-text cells pass through unchanged.
    pub fn expanded(self) -> Self {
        match self {
            Self::Text(s) => Self::Text(labrank_text::expand_abbreviations(&s)),
            other => other,
        }
    }

    /// Clean then expand as a member of a text column. Always yields
    /// [`Cell::Text`]: numeric literals keep their digits, missing cells
    /// become empty.
    pub fn normalized(&self) -> Self {
        match self {
            Self::Text(s) | Self::Number(s) => Self::Text(labrank_text::normalize(s)),
            Self::Missing => Self::Text(String::new()),
        }
    }
}

/// One lab-test definition: a row of cells aligned with its dataset's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    cells: Vec<Cell>,
}

impl Record {
    /// Create a record from cells in column order.
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// All cells in column order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The cell under `column`, if the column exists.
    pub fn get(&self, columns: &[String], column: &str) -> Option<&Cell> {
        columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.cells.get(idx))
    }

    /// The raw string under `column`, or `""` when absent or missing.
    pub fn field(&self, columns: &[String], column: &str) -> &str {
        self.get(columns, column).map_or("", Cell::as_str)
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<Cell> {
        &mut self.cells
    }
}
