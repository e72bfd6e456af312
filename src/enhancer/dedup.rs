//! Per-query deduplication by LOINC identifier.
//!
//! Results are partitioned by query (groups ordered by first appearance)
//! and each partition keeps the first row seen for every identifier.
//! A blank identifier is a key like any other: only the first blank row
//! of a group survives.

use std::collections::{HashMap, HashSet};

use super::output::OutputRow;

/// Drop repeated identifiers within each query group, keeping the first
/// occurrence. Order within a group is preserved.
pub fn deduplicate(rows: Vec<OutputRow>) -> Vec<OutputRow> {
    let mut groups: Vec<Vec<OutputRow>> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut seen: Vec<HashSet<String>> = Vec::new();

    for row in rows {
        let idx = *group_index.entry(row.query.clone()).or_insert_with(|| {
            groups.push(Vec::new());
            seen.push(HashSet::new());
            groups.len() - 1
        });
        if seen[idx].insert(row.identifier.clone()) {
            groups[idx].push(row);
        } else {
            tracing::debug!(query = %row.query, identifier = %row.identifier, "dropping duplicate result");
        }
    }

    groups.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(query: &str, identifier: &str, score: f64) -> OutputRow {
        OutputRow {
            query: query.into(),
            identifier: identifier.into(),
            name: String::new(),
            component: String::new(),
            system: String::new(),
            property: String::new(),
            measurement: String::new(),
            normalized_score: score,
        }
    }

    fn ids(rows: &[OutputRow]) -> Vec<(&str, &str)> {
        rows.iter()
            .map(|r| (r.query.as_str(), r.identifier.as_str()))
            .collect()
    }

    #[test]
    fn keeps_first_occurrence_per_query() {
        let rows = deduplicate(vec![
            row("q", "a", 0.2),
            row("q", "b", 0.5),
            row("q", "a", 0.9),
        ]);
        assert_eq!(ids(&rows), vec![("q", "a"), ("q", "b")]);
        assert!((rows[0].normalized_score - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn same_identifier_survives_in_different_queries() {
        let rows = deduplicate(vec![row("q1", "a", 1.0), row("q2", "a", 1.0)]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn groups_follow_first_appearance() {
        let rows = deduplicate(vec![
            row("q1", "a", 1.0),
            row("q2", "b", 1.0),
            row("q1", "c", 1.0),
        ]);
        assert_eq!(ids(&rows), vec![("q1", "a"), ("q1", "c"), ("q2", "b")]);
    }

    #[test]
    fn blank_identifiers_collapse_to_first() {
        let rows = deduplicate(vec![
            row("q", "", 1.0),
            row("q", "", 0.5),
            row("q", "x-1", 0.2),
        ]);
        assert_eq!(ids(&rows), vec![("q", ""), ("q", "x-1")]);
        assert!((rows[0].normalized_score - 1.0).abs() < f64::EPSILON);
    }
}
