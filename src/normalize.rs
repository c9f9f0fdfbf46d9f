//! Text normalization seams.
//!
//! The engine never tokenizes or parses text itself. It relies on two pure
//! string collaborators, both behind traits so a pipeline can plug in its own:
//!
//! - [`NameNormalizer`]: turns a raw surface into a display-clean name
//!   (punctuation and possessive markers stripped) and a comparison key
//!   (lower-cased, leading honorifics removed).
//! - [`PronounClassifier`]: vetoes pronoun forms from becoming names.
//!
//! ```rust
//! use nomina::normalize::{DefaultNormalizer, NameNormalizer};
//!
//! let n = DefaultNormalizer;
//! assert_eq!(n.clean("\"Harry's,"), "Harry");
//! assert_eq!(n.comparison_key("Mr. Smith"), "smith");
//! assert_eq!(n.comparison_key("King"), "king");
//! ```

use crate::lexicon;

/// Cleans raw surfaces into comparable names.
pub trait NameNormalizer: Send + Sync {
    /// Display-clean form: edge punctuation, possessive marker and extra
    /// whitespace removed. May be empty.
    fn clean(&self, raw: &str) -> String;

    /// Case-insensitive comparison key of a cleaned name. Leading honorifics
    /// are dropped as long as something remains.
    fn comparison_key(&self, clean: &str) -> String {
        core_tokens(clean)
            .iter()
            .map(|t| t.trim_end_matches('.').to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Decides whether a surface is a pronoun.
pub trait PronounClassifier: Send + Sync {
    /// True if `text` is a pronoun (and so can never name an entity).
    fn is_pronoun(&self, text: &str) -> bool;
}

/// English normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNormalizer;

impl NameNormalizer for DefaultNormalizer {
    fn clean(&self, raw: &str) -> String {
        let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '’');
        let stripped = strip_possessive(trimmed);
        let stripped = stripped.trim_matches(|c: char| !c.is_alphanumeric());
        tokens(stripped).join(" ")
    }
}

/// English pronoun list, including singular "they" and neopronouns.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishPronouns;

impl PronounClassifier for EnglishPronouns {
    fn is_pronoun(&self, text: &str) -> bool {
        let words = tokens(text);
        words.len() == 1 && lexicon::is_pronoun(words[0])
    }
}

/// Whitespace tokens.
#[must_use]
pub fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Tokens of a cleaned name with leading honorifics removed, keeping at
/// least one token ("Mr. Smith" -> `["Smith"]`, "King" -> `["King"]`).
#[must_use]
pub fn core_tokens(clean: &str) -> Vec<&str> {
    let all = tokens(clean);
    let mut start = 0;
    while start + 1 < all.len() && lexicon::is_title_prefix(all[start]) {
        start += 1;
    }
    all[start..].to_vec()
}

/// First character is upper-case.
#[must_use]
pub fn is_capitalized(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}

/// Every letter is lower-case.
#[must_use]
pub fn is_lowercase_word(token: &str) -> bool {
    token.chars().any(char::is_alphabetic)
        && token
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(char::is_lowercase)
}

/// True if the raw surface carries a possessive marker.
#[must_use]
pub fn is_possessive(raw: &str) -> bool {
    let trimmed = raw.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '’');
    trimmed.ends_with("'s")
        || trimmed.ends_with("’s")
        || trimmed.ends_with("s'")
        || trimmed.ends_with("s’")
}

fn strip_possessive(text: &str) -> &str {
    for marker in ["'s", "’s"] {
        if let Some(rest) = text.strip_suffix(marker) {
            return rest;
        }
    }
    for marker in ["'", "’"] {
        if let Some(rest) = text.strip_suffix(marker) {
            if rest.ends_with('s') {
                return rest;
            }
        }
    }
    text
}
