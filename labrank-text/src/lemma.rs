//! Dictionary-free noun lemmatiser.
//!
//! Reduces plural nouns to their singular base form with a small table of
//! irregular forms followed by suffix-detachment rules:
//!
//! ```text
//! irregular table → protected endings → ies→y, sses→ss, (ch|sh|x)es→\1, s→""
//! ```
//!
//! Tokens that are short, contain non-alphabetic characters, or end in a
//! protected suffix (`ss`, `us`, `is`, `as`, `ics`) pass through unchanged,
//! so singular forms such as `mass`, `status`, `analysis` or `pancreas` are
//! never mangled.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Irregular plurals and invariant words that the suffix rules would break.
const IRREGULAR: &[(&str, &str)] = &[
    ("aids", "aids"),
    ("analyses", "analysis"),
    ("ascites", "ascites"),
    ("bacteria", "bacterium"),
    ("biceps", "biceps"),
    ("caries", "caries"),
    ("children", "child"),
    ("diabetes", "diabetes"),
    ("diagnoses", "diagnosis"),
    ("faeces", "faeces"),
    ("feces", "feces"),
    ("feet", "foot"),
    ("fungi", "fungus"),
    ("herpes", "herpes"),
    ("indices", "index"),
    ("lens", "lens"),
    ("matrices", "matrix"),
    ("measles", "measles"),
    ("men", "man"),
    ("mice", "mouse"),
    ("mumps", "mumps"),
    ("nuclei", "nucleus"),
    ("rabies", "rabies"),
    ("scabies", "scabies"),
    ("series", "series"),
    ("species", "species"),
    ("teeth", "tooth"),
    ("testes", "testis"),
    ("triceps", "triceps"),
    ("vertebrae", "vertebra"),
    ("women", "woman"),
];

/// Endings that mark a singular noun despite the trailing `s`.
const PROTECTED_SUFFIXES: &[&str] = &["ss", "us", "is", "as", "ics"];

/// Tokens this short are never reduced (`gas`, `abs`, `pcs`).
const MIN_REDUCIBLE_LEN: usize = 4;

fn irregular() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| IRREGULAR.iter().copied().collect())
}

/// Reduce a lowercased token to its dictionary base form.
///
/// Returns the input unchanged (borrowed) when no rule applies.
pub fn lemmatize(token: &str) -> Cow<'_, str> {
    if let Some(base) = irregular().get(token) {
        return Cow::Borrowed(*base);
    }

    if token.len() < MIN_REDUCIBLE_LEN
        || !token.chars().all(|c| c.is_ascii_lowercase())
        || !token.ends_with('s')
        || PROTECTED_SUFFIXES.iter().any(|s| token.ends_with(s))
    {
        return Cow::Borrowed(token);
    }

    if let Some(stem) = token.strip_suffix("ies") {
        if stem.len() >= 2 {
            return Cow::Owned(format!("{stem}y"));
        }
    }
    if let Some(stem) = token.strip_suffix("sses") {
        return Cow::Owned(format!("{stem}ss"));
    }
    for suffix in ["ches", "shes", "xes"] {
        if token.ends_with(suffix) {
            return Cow::Borrowed(&token[..token.len() - 2]);
        }
    }

    Cow::Borrowed(&token[..token.len() - 1])
}
