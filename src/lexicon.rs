//! Fixed word lists used by matching, scoring, tiering and filtering.
//!
//! All lookups are case-insensitive and ignore a trailing period, so
//! `"Mr."`, `"mr"` and `"MR"` are the same title prefix.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Tokens that may join a name to its extension ("Gandalf *the* Grey",
/// "Aragorn *son* *of* Arathorn", "John Smith *Jr*").
pub const CONNECTORS: &[&str] = &[
    "the", "of", "and", "son", "daughter", "jr", "sr", "ii", "iii", "iv",
];

/// Single words that name a role rather than an individual.
pub const GENERIC_TITLES: &[&str] = &[
    "professor", "king", "queen", "prince", "princess", "lord", "lady", "sir", "master",
    "mister", "mistress", "madam", "captain", "general", "doctor", "house", "father",
    "mother", "uncle", "aunt", "brother", "sister", "chief", "duke", "duchess", "earl",
    "baron", "emperor", "empress", "headmaster", "headmistress", "minister", "wizard",
    "witch", "steward", "knight", "commander", "sergeant", "officer", "man", "woman", "boy",
    "girl", "sire", "majesty", "highness", "council", "school", "city", "village", "castle",
];

/// Honorifics that may open a personal name.
pub const TITLE_PREFIXES: &[&str] = &[
    "mr", "mrs", "ms", "miss", "mx", "dr", "sir", "dame", "lady", "lord", "king", "queen",
    "prince", "princess", "professor", "prof", "captain", "capt", "master", "madam",
    "madame", "uncle", "aunt", "father", "mother", "brother", "sister", "saint", "st",
    "general", "lieutenant", "sergeant", "duke", "duchess", "count", "countess", "baron",
    "emperor", "empress", "headmaster", "headmistress",
];

/// Words that open clauses rather than names.
pub const FUNCTION_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "from", "if", "in", "into", "nor",
    "on", "or", "so", "than", "that", "then", "though", "to", "when", "where", "while",
    "with", "yet", "he", "she", "it", "they", "we", "i", "you", "his", "her", "its",
    "their", "was", "were", "is", "are", "had", "has", "have", "did", "do", "not", "no",
    "all", "some", "this", "these", "those", "there", "here", "after", "before",
    "because", "although", "once", "until", "unless", "what", "which", "who",
];

/// Names that are never entities on their own; dropped by the filter stage.
pub const STOPWORDS: &[&str] = &[
    "chapter", "prologue", "epilogue", "part", "book", "yes", "no", "okay", "ok", "well",
    "oh", "ah", "hey", "hmm", "mr", "mrs", "ms", "dr", "the", "then", "now", "suddenly",
    "however", "meanwhile", "perhaps", "maybe", "please", "thanks", "sorry", "hello",
    "goodbye", "everyone", "someone", "nobody", "nothing", "something", "anything",
    "everything", "today", "tomorrow", "tonight", "yesterday",
];

/// Capitalized-at-sentence-start words that extractors mistake for names.
pub const COMMON_WORDS: &[&str] = &[
    "after", "again", "also", "always", "never", "what", "why", "how", "who", "whatever",
    "still", "just", "even", "only", "first", "last", "next", "later", "soon", "together",
    "inside", "outside", "behind", "instead", "finally", "sometimes", "somewhere",
    "anyway", "besides", "indeed", "certainly", "surely", "quickly", "slowly", "silence",
    "dinner", "breakfast", "lunch", "morning", "evening", "night", "monday", "tuesday",
    "wednesday", "thursday", "friday", "saturday", "sunday", "good", "great", "right",
    "left", "thank", "sir", "madam",
];

/// Ordinary lower-case words that SPELL/MATERIAL/MAGIC extractors pick up.
pub const COMMON_LOWERCASE: &[&str] = &[
    "fire", "water", "light", "dark", "darkness", "stone", "gold", "silver", "iron",
    "steel", "wood", "glass", "shadow", "wind", "ice", "earth", "air", "blood", "bone",
    "salt", "ash", "smoke", "flame", "lightning", "thunder", "magic", "spell", "charm",
    "potion", "power", "energy", "crystal", "dust", "sand", "rock", "metal", "cloth",
    "paper", "silk", "leather", "poison", "curse",
];

/// Organizations that outrank any other type in cross-type merging.
pub const KNOWN_ORGANIZATIONS: &[&str] = &[
    "hogwarts", "ministry of magic", "the ministry", "gringotts", "order of the phoenix",
    "the order of the phoenix", "death eaters", "the death eaters", "dumbledore's army",
    "the white council", "fellowship of the ring", "the fellowship", "night's watch",
    "the night's watch", "the kingsguard", "the iron bank", "the citadel", "the jedi order",
    "starfleet", "the shire council",
];

/// Tokens that describe rather than name ("the *former* king", "Cato the *Elder*").
pub const STYLISTIC_DESCRIPTORS: &[&str] = &[
    "former", "elder", "younger", "old", "young", "late", "great", "little", "big",
    "good", "wise", "ancient",
];

/// English pronouns, including singular "they" and common neopronouns.
pub const PRONOUNS: &[&str] = &[
    "he", "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "themself", "i", "me", "my", "mine",
    "myself", "we", "us", "our", "ours", "ourselves", "you", "your", "yours", "yourself",
    "yourselves", "who", "whom", "whose", "xe", "xem", "xyr", "ze", "zir", "ey", "em",
    "eir", "fae", "faer",
];

fn set(words: &'static [&'static str]) -> HashSet<&'static str> {
    words.iter().copied().collect()
}

static CONNECTOR_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| set(CONNECTORS));
static GENERIC_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| set(GENERIC_TITLES));
static TITLE_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| set(TITLE_PREFIXES));
static FUNCTION_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| set(FUNCTION_WORDS));
static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| set(STOPWORDS));
static COMMON_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| set(COMMON_WORDS));
static LOWERCASE_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| set(COMMON_LOWERCASE));
static ORG_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| set(KNOWN_ORGANIZATIONS));
static STYLISTIC_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| set(STYLISTIC_DESCRIPTORS));
static PRONOUN_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| set(PRONOUNS));

fn fold(word: &str) -> String {
    word.trim().trim_end_matches('.').to_lowercase()
}

fn contains(set: &HashSet<&'static str>, word: &str) -> bool {
    set.contains(fold(word).as_str())
}

/// Connector token ("the", "of", "jr", ...).
#[must_use]
pub fn is_connector(token: &str) -> bool {
    contains(&CONNECTOR_SET, token)
}

/// Single word naming a role ("King", "Professor").
#[must_use]
pub fn is_generic_title(word: &str) -> bool {
    contains(&GENERIC_SET, word)
}

/// Honorific prefix ("Mr.", "Professor").
#[must_use]
pub fn is_title_prefix(token: &str) -> bool {
    contains(&TITLE_SET, token)
}

/// Bare function word, compared exactly as written in lower case.
#[must_use]
pub fn is_function_word(token: &str) -> bool {
    FUNCTION_SET.contains(token)
}

/// Filter-stage stopword.
#[must_use]
pub fn is_stopword(name: &str) -> bool {
    contains(&STOPWORD_SET, name)
}

/// Common word mistaken for a name (includes stopwords).
#[must_use]
pub fn is_common_word(name: &str) -> bool {
    contains(&COMMON_SET, name) || is_stopword(name)
}

/// Ordinary lower-case word typical of SPELL/MATERIAL/MAGIC noise.
#[must_use]
pub fn is_common_lowercase(word: &str) -> bool {
    contains(&LOWERCASE_SET, word)
}

/// Organization that always wins cross-type merges.
#[must_use]
pub fn is_known_organization(name: &str) -> bool {
    let folded = fold(name);
    ORG_SET.contains(folded.as_str())
        || folded
            .strip_prefix("the ")
            .is_some_and(|rest| ORG_SET.contains(rest))
}

/// Stylistic descriptor token ("former", "elder").
#[must_use]
pub fn is_stylistic_descriptor(token: &str) -> bool {
    contains(&STYLISTIC_SET, token)
}

/// English pronoun.
#[must_use]
pub fn is_pronoun(word: &str) -> bool {
    contains(&PRONOUN_SET, word)
}

/// Token ending like an inflected verb ("walked", "running").
#[must_use]
pub fn has_verb_suffix(token: &str) -> bool {
    let lower = token.to_lowercase();
    lower.chars().count() > 4 && (lower.ends_with("ing") || lower.ends_with("ed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case_and_period() {
        assert!(is_title_prefix("Mr."));
        assert!(is_title_prefix("PROFESSOR"));
        assert!(is_connector("Jr."));
        assert!(is_generic_title("King"));
        assert!(!is_generic_title("Arthur"));
    }

    #[test]
    fn function_words_are_case_sensitive() {
        assert!(is_function_word("and"));
        assert!(!is_function_word("The"));
    }

    #[test]
    fn known_organizations_tolerate_article() {
        assert!(is_known_organization("Hogwarts"));
        assert!(is_known_organization("The Hogwarts"));
        assert!(is_known_organization("the Ministry of Magic"));
        assert!(!is_known_organization("Hobbiton"));
    }

    #[test]
    fn verb_suffix() {
        assert!(has_verb_suffix("walked"));
        assert!(has_verb_suffix("Running"));
        assert!(!has_verb_suffix("Red"));
        assert!(!has_verb_suffix("King"));
    }

    #[test]
    fn stopwords_are_common_words() {
        assert!(is_common_word("Chapter"));
        assert!(is_common_word("Finally"));
        assert!(!is_stopword("Finally"));
    }
}
