//! # labrank-text
//!
//! Deterministic text normalisation for laboratory-test descriptions.
//!
//! Every free-text field of a lab-test record passes through the same two
//! transforms before it is scored:
//!
//! 1. [`clean`]: lowercase, strip punctuation, drop stop-words, lemmatise.
//! 2. [`expand_abbreviations`]: replace LOINC shorthand (`bld`, `ser`,
//!    `mcnc`, ...) with its spelled-out form.
//!
//! ## Design
//!
//! - Pure functions: no I/O, no allocation beyond the returned string
//! - Static tables (stop-words, lemma exceptions, abbreviations) are built
//!   once per process and never mutated
//! - Cleaning runs before expansion, and stop-word removal runs before
//!   lemmatisation
//!
//! # Examples
//!
//! ```
//! let cleaned = labrank_text::clean("Glucose [Mass/volume] in Bld");
//! assert_eq!(cleaned, "glucose mass volume bld");
//! assert_eq!(
//!     labrank_text::expand_abbreviations(&cleaned),
//!     "glucose mass volume blood"
//! );
//! ```

pub mod abbreviations;
pub mod lemma;
pub mod stopwords;

pub use abbreviations::{abbreviation_table, expand_abbreviations};
pub use lemma::lemmatize;
pub use stopwords::is_stop_word;

/// Clean a piece of free text.
///
/// Lowercases the input, replaces every character that is neither a word
/// character (alphanumeric or `_`) nor whitespace with a space, splits on
/// whitespace, removes stop-words, lemmatises the remaining tokens, and
/// rejoins them with single spaces.
///
/// Never fails: empty or punctuation-only input yields an empty string.
pub fn clean(text: &str) -> String {
    let lowered = text.to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    spaced
        .split_whitespace()
        .filter(|token| !is_stop_word(token))
        .map(lemmatize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clean then expand abbreviations, the order the scoring pipeline uses.
pub fn normalize(text: &str) -> String {
    expand_abbreviations(&clean(text))
}
