//! End-to-end runs of the enhancer over temporary input folders.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use labrank::config::RankConfig;
use labrank::enhancer::read_results;
use labrank::registry::{QueryEntry, QueryRegistry};
use labrank::{DatasetEnhancer, EmbeddingProvider};
use std::path::Path;

const THREE_ROWS: &str = "LOINC_NUM,LONG_COMMON_NAME,COMPONENT,SYSTEM,PROPERTY\n\
    A-1,Glucose [Mass/volume] in Blood,Glucose,Blood,MCnc\n\
    B-2,Glucose [Mass/volume] in Urine,Glucose in Urine,Blood,MCnc\n\
    C-3,Bilirubin [Mass/volume] in Serum,Bilirubin,Serum,MCnc\n";

fn glucose_entry() -> QueryEntry {
    QueryEntry {
        query: "glucose in blood".into(),
        component: "glucose".into(),
        system: "blood".into(),
    }
}

fn lexical_config(root: &Path) -> RankConfig {
    let mut config = RankConfig::default();
    config.input.dir = root.join("downloads");
    config.output.path = root.join("out").join("enhanced.csv");
    config.embedding.enabled = false;
    std::fs::create_dir_all(&config.input.dir).unwrap();
    config
}

fn write_input(config: &RankConfig, name: &str, content: &str) {
    std::fs::write(config.input.dir.join(name), content).unwrap();
}

fn run(config: &RankConfig, entries: &[QueryEntry]) -> labrank::EnhanceReport {
    let registry = QueryRegistry::from_entries(entries).unwrap();
    let provider = EmbeddingProvider::disabled();
    DatasetEnhancer::new(config.clone(), registry, &provider)
        .run()
        .unwrap()
}

#[test]
fn three_row_scenario_normalises_lexical_scores() {
    let dir = tempfile::tempdir().unwrap();
    let config = lexical_config(dir.path());
    write_input(&config, "glucose.csv", THREE_ROWS);

    let report = run(&config, &[glucose_entry()]);
    assert_eq!(report.files_scored, 1);
    assert_eq!(report.results_written, 3);
    assert!(report.output_created);

    let rows = read_results(&config.output.path).unwrap();
    let scores: Vec<(&str, f64)> = rows
        .iter()
        .map(|r| (r.identifier.as_str(), r.normalized_score))
        .collect();
    // A: 36 + 9 = 45, B: 0.5·36 + 9 = 27, C: 0.
    assert_eq!(scores[0].0, "A-1");
    assert!((scores[0].1 - 1.0).abs() < 1e-9);
    assert_eq!(scores[1].0, "B-2");
    assert!((scores[1].1 - 0.6).abs() < 1e-9);
    assert_eq!(scores[2].0, "C-3");
    assert!(scores[2].1.abs() < 1e-9);

    assert_eq!(rows[0].query, "glucose in blood");
    assert_eq!(rows[0].name, "glucose mass volume blood");
    assert_eq!(rows[0].measurement, "mass volume");
    assert_eq!(rows[1].component, "glucose urine");
}

#[test]
fn second_run_appends_without_repeating_header() {
    let dir = tempfile::tempdir().unwrap();
    let config = lexical_config(dir.path());
    write_input(&config, "glucose.csv", THREE_ROWS);

    assert!(run(&config, &[glucose_entry()]).output_created);
    assert!(!run(&config, &[glucose_entry()]).output_created);

    let content = std::fs::read_to_string(&config.output.path).unwrap();
    assert_eq!(content.matches("Normalized_Score").count(), 1);
    // Append-only across runs: identifiers repeat between runs.
    assert_eq!(read_results(&config.output.path).unwrap().len(), 6);
}

#[test]
fn unusable_files_are_skipped_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = lexical_config(dir.path());
    write_input(&config, "a_good.csv", THREE_ROWS);
    write_input(&config, "b_no_identifier.csv", "Component,System\nGlucose,Blood\n");
    write_input(&config, "c_ignored.txt", "not an input\n");

    let report = run(&config, &[glucose_entry()]);
    assert_eq!(report.files_scored, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].file.ends_with("b_no_identifier.csv"));
    assert_eq!(report.results_written, 3);
}

#[test]
fn duplicates_dropped_within_query_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = lexical_config(dir.path());
    write_input(&config, "first.csv", THREE_ROWS);
    write_input(&config, "second.tsv", "LOINC_NUM\tCOMPONENT\tSYSTEM\nA-1\tGlucose\tSerum\nD-4\tGlucose\tBlood\n");

    let bilirubin = QueryEntry {
        query: "bilirubin in plasma".into(),
        component: "bilirubin".into(),
        system: "plasma".into(),
    };
    let report = run(&config, &[glucose_entry(), bilirubin]);
    assert_eq!(report.results_scored, 10);
    assert_eq!(report.results_written, 8);

    let rows = read_results(&config.output.path).unwrap();
    // Groups follow registry order; first-seen identifier wins.
    let pairs: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.query.as_str(), r.identifier.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("bilirubin in plasma", "A-1"),
            ("bilirubin in plasma", "B-2"),
            ("bilirubin in plasma", "C-3"),
            ("bilirubin in plasma", "D-4"),
            ("glucose in blood", "A-1"),
            ("glucose in blood", "B-2"),
            ("glucose in blood", "C-3"),
            ("glucose in blood", "D-4"),
        ]
    );
    let glucose_a = rows
        .iter()
        .find(|r| r.query == "glucose in blood" && r.identifier == "A-1")
        .unwrap();
    assert!((glucose_a.normalized_score - 1.0).abs() < 1e-9);
    for row in &rows {
        assert!((0.0..=1.0).contains(&row.normalized_score));
    }
}

#[test]
fn blank_identifiers_are_deduplicated_like_any_other() {
    let dir = tempfile::tempdir().unwrap();
    let config = lexical_config(dir.path());
    write_input(
        &config,
        "blanks.csv",
        "LOINC_NUM,COMPONENT,SYSTEM
,Glucose,Blood
,Bilirubin,Serum
X-1,Glucose,Urine
",
    );

    let report = run(&config, &[glucose_entry()]);
    assert_eq!(report.results_scored, 3);
    assert_eq!(report.results_written, 2);

    let rows = read_results(&config.output.path).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["", "X-1"]);
    assert_eq!(rows[0].component, "glucose");
}

#[test]
fn equal_scores_normalise_to_one() {
    let dir = tempfile::tempdir().unwrap();
    let config = lexical_config(dir.path());
    write_input(
        &config,
        "flat.csv",
        "LOINC_NUM,COMPONENT,SYSTEM\nX-1,Sodium,Urine\nX-2,Potassium,Urine\n",
    );

    run(&config, &[glucose_entry()]);
    let rows = read_results(&config.output.path).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| (r.normalized_score - 1.0).abs() < f64::EPSILON));
}

#[test]
fn no_results_leaves_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = lexical_config(dir.path());
    write_input(&config, "header_only.csv", "LOINC_NUM,COMPONENT,SYSTEM\n");

    let report = run(&config, &[glucose_entry()]);
    assert_eq!(report.files_scored, 1);
    assert_eq!(report.results_written, 0);
    assert!(!config.output.path.exists());
}
