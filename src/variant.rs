//! Name variant matching and canonical ranking.
//!
//! Every rule here is a standalone predicate or ranking key so it can be
//! tested on its own:
//!
//! - [`is_variant_match`]: do two cleaned names denote the same entity?
//! - [`informativeness`]: which of two forms is the better canonical during
//!   ingestion?
//! - [`is_descriptor_extension`]: is a name just another name plus a
//!   trailing "the X" / "of X" clause?
//! - [`select_canonical`]: the full finalization ranking over a cluster's
//!   canonical and aliases.
//!
//! ```rust
//! use nomina::variant::is_variant_match;
//!
//! assert!(is_variant_match("Gandalf", "Gandalf the Grey"));
//! assert!(is_variant_match("Arathorn", "Aragorn son of Arathorn"));
//! assert!(!is_variant_match("King", "King Arthur"));
//! assert!(!is_variant_match("Harry", "Harry potter"));
//! ```

use std::cmp::Reverse;

use crate::lexicon;
use crate::normalize::{core_tokens, is_capitalized, is_lowercase_word, tokens};

// =============================================================================
// Variant match
// =============================================================================

/// True if `a` and `b` (both already cleaned) name the same entity.
///
/// Names match when their honorific-free token sequences are equal ignoring
/// case, or when one is a prefix or suffix of the other and the differing
/// tokens form a connector-joined extension whose non-connector tokens are
/// all capitalized. A lone generic title never matches a multi-word name.
#[must_use]
pub fn is_variant_match(a: &str, b: &str) -> bool {
    let core_a = core_tokens(a);
    let core_b = core_tokens(b);
    if core_a.is_empty() || core_b.is_empty() {
        return false;
    }
    if tokens_equal(&core_a, &core_b) {
        return true;
    }
    if generic_title_barrier(a, b) {
        return false;
    }

    let (short, long) = match core_a.len().cmp(&core_b.len()) {
        std::cmp::Ordering::Less => (&core_a, &core_b),
        std::cmp::Ordering::Greater => (&core_b, &core_a),
        std::cmp::Ordering::Equal => return false,
    };

    let n = short.len();
    if tokens_equal(&long[..n], short) && is_connector_extension(&long[n..], true) {
        return true;
    }
    let split = long.len() - n;
    tokens_equal(&long[split..], short) && is_connector_extension(&long[..split], false)
}

/// A single generic title on one side and a multi-word name on the other.
fn generic_title_barrier(a: &str, b: &str) -> bool {
    let ta = tokens(a);
    let tb = tokens(b);
    let bare = |t: &[&str]| t.len() == 1 && lexicon::is_generic_title(t[0]);
    (bare(&ta[..]) && tb.len() > 1) || (bare(&tb[..]) && ta.len() > 1)
}

/// `extra` is what the longer name adds. For a prefix match the connector
/// must open the extension ("Gandalf | the Grey"); for a suffix match it
/// must close it ("Aragorn son of | Arathorn").
fn is_connector_extension(extra: &[&str], after_shared: bool) -> bool {
    let adjacent = if after_shared {
        extra.first()
    } else {
        extra.last()
    };
    let Some(adjacent) = adjacent else {
        return false;
    };
    lexicon::is_connector(adjacent)
        && extra
            .iter()
            .filter(|t| !lexicon::is_connector(t))
            .all(|t| is_capitalized(t))
}

fn tokens_equal(a: &[&str], b: &[&str]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| fold_token(x) == fold_token(y))
}

fn fold_token(token: &str) -> String {
    token.trim_end_matches('.').to_lowercase()
}

// =============================================================================
// Informativeness
// =============================================================================

/// Ordering key: more non-connector tokens, then more raw tokens, then the
/// shorter string wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Informativeness {
    /// Tokens that are not connectors.
    pub informative_tokens: usize,
    /// All tokens.
    pub raw_tokens: usize,
    /// Character length, reversed so shorter compares greater.
    pub brevity: Reverse<usize>,
}

/// Informativeness of a cleaned name.
#[must_use]
pub fn informativeness(name: &str) -> Informativeness {
    let all = tokens(name);
    Informativeness {
        informative_tokens: all.iter().filter(|t| !lexicon::is_connector(t)).count(),
        raw_tokens: all.len(),
        brevity: Reverse(name.chars().count()),
    }
}

/// True if `longer` is `shorter` followed by a "the X" or "of X" clause.
///
/// "Gandalf the Grey" extends "Gandalf"; "Gandalf Stormcrow" does not.
#[must_use]
pub fn is_descriptor_extension(longer: &str, shorter: &str) -> bool {
    let long = tokens(longer);
    let short = tokens(shorter);
    if short.is_empty() || long.len() < short.len() + 2 {
        return false;
    }
    tokens_equal(&long[..short.len()], &short)
        && matches!(fold_token(long[short.len()]).as_str(), "the" | "of")
}

/// Ingestion-time upgrade rule: should `candidate` replace `current`?
#[must_use]
pub fn should_promote(current: &str, candidate: &str) -> bool {
    informativeness(candidate) > informativeness(current)
        && !is_descriptor_extension(current, candidate)
}

/// Two or more tokens, at least one of which is neither a title nor a
/// connector ("King Arthur" yes, "the King" no).
#[must_use]
pub fn is_specific_multiword(name: &str) -> bool {
    let all = tokens(name);
    all.len() >= 2
        && all.iter().any(|t| {
            !lexicon::is_generic_title(t) && !lexicon::is_title_prefix(t) && !lexicon::is_connector(t)
        })
}

// =============================================================================
// Canonical ranking
// =============================================================================

/// Letters, apostrophes, hyphens and spaces only. A period is tolerated at
/// the end of a token ("Mr.", "J. R. R.").
#[must_use]
pub fn is_clean_name(name: &str) -> bool {
    !name.is_empty()
        && tokens(name).iter().all(|token| {
            let body = token.strip_suffix('.').unwrap_or(token);
            !body.is_empty()
                && body
                    .chars()
                    .all(|c| c.is_alphabetic() || matches!(c, '\'' | '’' | '-'))
        })
}

/// A "the"/"of" clause whose head word is lower-case ("Bilbo the old
/// hobbit"). Capitalized epithets ("Gandalf the Grey") do not count.
#[must_use]
pub fn has_descriptor_clause(name: &str) -> bool {
    let all = tokens(name);
    all.windows(2).enumerate().any(|(i, pair)| {
        i > 0
            && matches!(fold_token(pair[0]).as_str(), "the" | "of")
            && is_lowercase_word(pair[1])
    })
}

/// Any token is a stylistic descriptor ("former", "elder").
#[must_use]
pub fn has_stylistic_descriptor(name: &str) -> bool {
    tokens(name)
        .iter()
        .any(|t| lexicon::is_stylistic_descriptor(t))
}

type CanonicalRank = (bool, bool, bool, Informativeness, Reverse<String>);

fn canonical_rank(name: &str) -> CanonicalRank {
    (
        is_clean_name(name),
        !has_descriptor_clause(name),
        !has_stylistic_descriptor(name),
        informativeness(name),
        Reverse(name.to_lowercase()),
    )
}

/// Best canonical among `candidates`.
///
/// Ranked by cleanliness, then no descriptor clause, then no stylistic
/// descriptor, then [`informativeness`]; remaining ties go to the
/// alphabetically first form so the choice never depends on input order.
#[must_use]
pub fn select_canonical<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .max_by_key(|c| canonical_rank(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_ignoring_case_and_titles() {
        assert!(is_variant_match("Frodo", "frodo"));
        assert!(is_variant_match("Mr. Smith", "Smith"));
        assert!(is_variant_match("Professor McGonagall", "McGonagall"));
    }

    #[test]
    fn connector_prefix_extension() {
        assert!(is_variant_match("Gandalf", "Gandalf the Grey"));
        assert!(is_variant_match("Gandalf the Grey", "Gandalf"));
        assert!(is_variant_match("John Smith", "John Smith Jr"));
    }

    #[test]
    fn connector_suffix_extension() {
        assert!(is_variant_match("Arathorn", "Aragorn son of Arathorn"));
    }

    #[test]
    fn rejects_plain_substrings() {
        assert!(!is_variant_match("Harry", "Harry Potter"));
        assert!(!is_variant_match("Potter", "Harry Potter"));
        assert!(!is_variant_match("Gandalf", "Gandalf the grey"));
        assert!(!is_variant_match("Sam", "Samwise"));
    }

    #[test]
    fn generic_title_barrier_both_ways() {
        assert!(!is_variant_match("King", "King of the North"));
        assert!(!is_variant_match("King of the North", "King"));
        assert!(is_variant_match("King", "king"));
    }

    #[test]
    fn empty_never_matches() {
        assert!(!is_variant_match("", ""));
        assert!(!is_variant_match("Frodo", ""));
    }

    #[test]
    fn informativeness_ordering() {
        assert!(informativeness("Gandalf the Grey") > informativeness("Gandalf"));
        assert!(informativeness("Mr. Smith") > informativeness("Smith"));
        // same informative count, fewer raw tokens loses
        assert!(informativeness("Son of Gondor") > informativeness("Gondor Son"));
        // full tie on counts: shorter wins
        assert!(informativeness("Ron") > informativeness("Ronald"));
    }

    #[test]
    fn descriptor_extension() {
        assert!(is_descriptor_extension("Gandalf the Grey", "Gandalf"));
        assert!(is_descriptor_extension("Denethor of Gondor", "Denethor"));
        assert!(!is_descriptor_extension("Gandalf Stormcrow", "Gandalf"));
        assert!(!is_descriptor_extension("Gandalf the", "Gandalf"));
    }

    #[test]
    fn promotion_blocks_descriptor_extension() {
        assert!(should_promote("Gandalf", "Gandalf the Grey"));
        assert!(!should_promote("Gandalf the Grey", "Gandalf"));
        assert!(!should_promote("Frodo Baggins", "Frodo"));
    }

    #[test]
    fn specific_multiword() {
        assert!(is_specific_multiword("King Arthur"));
        assert!(!is_specific_multiword("the King"));
        assert!(!is_specific_multiword("Arthur"));
    }

    #[test]
    fn cleanliness() {
        assert!(is_clean_name("O'Neill"));
        assert!(is_clean_name("Mary-Kate"));
        assert!(is_clean_name("J. R. R. Tolkien"));
        assert!(!is_clean_name("R2-D2"));
        assert!(!is_clean_name("Frodo (ring-bearer)"));
        assert!(!is_clean_name(""));
    }

    #[test]
    fn descriptor_clause_needs_lowercase_head() {
        assert!(has_descriptor_clause("Bilbo the old hobbit"));
        assert!(!has_descriptor_clause("Gandalf the Grey"));
        assert!(!has_descriptor_clause("the old man"));
    }

    #[test]
    fn ranking_prefers_clean_bare_names() {
        assert_eq!(
            select_canonical(["Bilbo the old hobbit", "Bilbo Baggins"]),
            Some("Bilbo Baggins")
        );
        assert_eq!(
            select_canonical(["Cato the Elder", "Cato"]),
            Some("Cato")
        );
        assert_eq!(
            select_canonical(["Gandalf", "Gandalf the Grey"]),
            Some("Gandalf the Grey")
        );
        assert_eq!(select_canonical(["R2D2", "Artoo"]), Some("Artoo"));
    }

    #[test]
    fn ranking_is_order_independent() {
        let a = select_canonical(["Sam", "Tom"]);
        let b = select_canonical(["Tom", "Sam"]);
        assert_eq!(a, b);
        assert_eq!(a, Some("Sam"));
        assert_eq!(select_canonical(std::iter::empty()), None);
    }
}
