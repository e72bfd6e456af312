//! Query Registry: canonical clinical queries and their structured intent.
//!
//! Each registered query maps to the LOINC `COMPONENT` and `SYSTEM` values a
//! perfectly relevant record would carry. Components and systems are stored
//! in their normalised (cleaned, lemmatised, expanded) form so they compare
//! directly against normalised record fields.
//!
//! The registry is validated when it is built; a run never discovers a bad
//! entry half way through.

use crate::error::{RankError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A registry entry as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEntry {
    /// Canonical query text (lowercase, trimmed).
    pub query: String,
    /// Expected LOINC component.
    pub component: String,
    /// Expected LOINC system.
    pub system: String,
}

/// Structured intent for one query. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryIntent {
    /// Canonical query text, also the registry key.
    pub query: String,
    /// Expected LOINC component, lowercase.
    pub component: String,
    /// Expected LOINC system, lowercase.
    pub system: String,
}

/// The built-in registry entries.
pub fn default_entries() -> Vec<QueryEntry> {
    [
        ("bilirubin in plasma", "bilirubin", "plasma"),
        ("glucose in blood", "glucose", "blood"),
        ("white blood cells count", "leukocyte", "blood"),
    ]
    .into_iter()
    .map(|(query, component, system)| QueryEntry {
        query: query.to_owned(),
        component: component.to_owned(),
        system: system.to_owned(),
    })
    .collect()
}

/// Fixed mapping from canonical query string to [`QueryIntent`].
///
/// Iteration order is lexicographic by query, so every run visits queries
/// (and therefore writes result groups) in the same order.
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
    intents: BTreeMap<String, QueryIntent>,
}

impl QueryRegistry {
    /// Build and validate a registry.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Config`] if a query is empty, not lowercase,
    /// has surrounding whitespace or is duplicated, or if its component or
    /// system is empty.
    pub fn from_entries(entries: &[QueryEntry]) -> Result<Self> {
        let mut intents = BTreeMap::new();
        for entry in entries {
            let query = entry.query.as_str();
            if query.trim().is_empty() {
                return Err(RankError::Config("registry query must not be empty".into()));
            }
            if query != query.trim() || query != query.to_lowercase() {
                return Err(RankError::Config(format!(
                    "registry query {query:?} must be trimmed lowercase text"
                )));
            }
            if entry.component.trim().is_empty() || entry.system.trim().is_empty() {
                return Err(RankError::Config(format!(
                    "registry query {query:?} needs a component and a system"
                )));
            }
            let intent = QueryIntent {
                query: query.to_owned(),
                component: entry.component.trim().to_lowercase(),
                system: entry.system.trim().to_lowercase(),
            };
            if intents.insert(query.to_owned(), intent).is_some() {
                return Err(RankError::Config(format!(
                    "registry query {query:?} is defined twice"
                )));
            }
        }
        Ok(Self { intents })
    }

    /// Look up the intent for `query` (trimmed and lowercased first).
    ///
    /// # Errors
    ///
    /// Returns [`RankError::UnknownQuery`] when the query is not registered.
    pub fn lookup(&self, query: &str) -> Result<&QueryIntent> {
        let key = query.trim().to_lowercase();
        self.intents
            .get(&key)
            .ok_or(RankError::UnknownQuery(key))
    }

    /// Registered intents in query order.
    pub fn iter(&self) -> impl Iterator<Item = &QueryIntent> {
        self.intents.values()
    }

    /// Number of registered queries.
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Returns `true` if no queries are registered.
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
