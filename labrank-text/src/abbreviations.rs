//! LOINC abbreviation expansion.
//!
//! LOINC display names use a compact vocabulary (`Bld`, `Ser/Plas`,
//! `MCnc`, `PrThr`). After cleaning, those tokens are lowercase words that
//! an embedding model has rarely seen, so they are replaced by the spelled
//! out term before scoring.
//!
//! Matching is exact and case-sensitive on whole tokens. No expansion
//! contains a token that is itself a key, which makes expansion idempotent.

use std::collections::HashMap;
use std::sync::OnceLock;

const ABBREVIATIONS: &[(&str, &str)] = &[
    // Specimen systems
    ("bld", "blood"),
    ("wb", "whole blood"),
    ("ser", "serum"),
    ("plas", "plasma"),
    ("ur", "urine"),
    ("csf", "cerebrospinal fluid"),
    ("bpu", "blood product unit"),
    ("art", "arterial"),
    ("ven", "venous"),
    ("cap", "capillary"),
    // Properties
    ("mcnc", "mass concentration"),
    ("scnc", "substance concentration"),
    ("ncnc", "number concentration"),
    ("acnc", "arbitrary concentration"),
    ("ccnc", "catalytic concentration"),
    ("mfr", "mass fraction"),
    ("nfr", "number fraction"),
    ("vfr", "volume fraction"),
    ("prthr", "presence threshold"),
    ("titr", "titer"),
    ("enzrat", "enzymatic rate"),
    // Scales and timing
    ("qn", "quantitative"),
    ("ord", "ordinal"),
    ("nom", "nominal"),
    ("pt", "point time"),
    ("24h", "24 hour"),
    // Analytes
    ("wbc", "white blood cell"),
    ("rbc", "red blood cell"),
    ("hgb", "hemoglobin"),
    ("hct", "hematocrit"),
    ("plt", "platelet"),
    ("mcv", "mean corpuscular volume"),
    ("bili", "bilirubin"),
    ("glu", "glucose"),
    ("gluc", "glucose"),
    ("chol", "cholesterol"),
    ("trig", "triglyceride"),
    ("creat", "creatinine"),
    ("alb", "albumin"),
    ("ab", "antibody"),
    ("ag", "antigen"),
    ("igg", "immunoglobulin g"),
    ("igm", "immunoglobulin m"),
    ("iga", "immunoglobulin a"),
    // General shorthand
    ("conc", "concentration"),
    ("lvl", "level"),
    ("auto", "automated"),
    ("calc", "calculated"),
    ("tot", "total"),
];

/// The process-wide abbreviation table, keyed by lowercase token.
pub fn abbreviation_table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| ABBREVIATIONS.iter().copied().collect())
}

/// Replace every whitespace-separated token found in the abbreviation table
/// with its expansion, rejoining with single spaces.
///
/// Tokens not in the table pass through unchanged.
pub fn expand_abbreviations(text: &str) -> String {
    let table = abbreviation_table();
    text.split_whitespace()
        .map(|token| table.get(token).copied().unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_tokens() {
        assert_eq!(expand_abbreviations("glucose bld"), "glucose blood");
        assert_eq!(expand_abbreviations("ser plas"), "serum plasma");
        assert_eq!(expand_abbreviations("wbc"), "white blood cell");
    }

    #[test]
    fn unknown_tokens_pass_through() {
        assert_eq!(expand_abbreviations("bilirubin total"), "bilirubin total");
    }

    #[test]
    fn match_is_case_sensitive() {
        assert_eq!(expand_abbreviations("BLD Bld bld"), "BLD Bld blood");
    }

    #[test]
    fn empty_input_yields_empty() {
        assert_eq!(expand_abbreviations(""), "");
        assert_eq!(expand_abbreviations("   "), "");
    }

    #[test]
    fn no_expansion_token_is_a_key() {
        let table = abbreviation_table();
        for (key, expansion) in ABBREVIATIONS {
            for token in expansion.split_whitespace() {
                assert!(
                    !table.contains_key(token),
                    "expansion of {key} contains key {token}"
                );
            }
        }
    }

    #[test]
    fn expansion_is_idempotent() {
        let inputs = [
            "glucose mass volume bld",
            "wbc bld auto",
            "bili tot ser plas mcnc pt qn",
            "hgb a1c hgb tot bld",
        ];
        for input in inputs {
            let once = expand_abbreviations(input);
            assert_eq!(expand_abbreviations(&once), once);
        }
    }

    #[test]
    fn keys_are_unique_and_lowercase() {
        assert_eq!(abbreviation_table().len(), ABBREVIATIONS.len());
        assert!(ABBREVIATIONS
            .iter()
            .all(|(k, _)| k.chars().all(|c| !c.is_uppercase())));
    }
}
