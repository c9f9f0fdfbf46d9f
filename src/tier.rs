//! Tier classification.
//!
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! 1. quality demotions (always TIER_C): encoding artifacts, truncated
//!    fragments, sentence fragments, common words;
//! 2. base tier from the confidence thresholds;
//! 3. promotions (only ever raise);
//! 4. the sentence-initial single-token demotion;
//! 5. otherwise the base tier, reason `confidence_X.XX`.
//!
//! Each demotion shape is its own predicate so the order above is the only
//! place they interact.
//!
//! ```rust
//! use nomina::tier::{assign_tier, TierFeatures, TierReason};
//! use nomina::config::TierConfig;
//! use nomina::{EntityType, Tier};
//!
//! let features = TierFeatures { has_ner_support: true, token_count: 1, mention_count: 1, ..Default::default() };
//! let t = assign_tier("Sam\u{0007}", &EntityType::Person, 0.95, &features, &TierConfig::default());
//! assert_eq!(t.tier, Tier::C);
//! assert_eq!(t.reason, TierReason::EncodingIssues);
//! ```

use std::fmt;

use crate::config::TierConfig;
use crate::lexicon;
use crate::normalize::{core_tokens, is_lowercase_word, tokens};
use crate::{Entity, EntityCluster, EntityType, Tier};

// =============================================================================
// Features and outcome
// =============================================================================

/// Signals about an entity that the tier rules read besides its name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierFeatures {
    /// Some source is NER or NER-equivalent (PATTERN).
    pub has_ner_support: bool,
    /// Every mention opens its sentence.
    pub sentence_initial_only: bool,
    /// Name tokens in the canonical, leading honorifics not counted
    /// ("Mr. Smith" has one).
    pub token_count: usize,
    /// Canonical opens with an honorific and has more after it.
    pub has_title_prefix: bool,
    /// Distinct mention positions.
    pub mention_count: usize,
}

impl TierFeatures {
    /// Features of a cluster as it stands.
    #[must_use]
    pub fn from_cluster(cluster: &EntityCluster) -> Self {
        let raw = tokens(cluster.canonical()).len();
        let core = core_tokens(cluster.canonical()).len();
        Self {
            has_ner_support: cluster.sources().iter().any(|p| p.is_ner_equivalent()),
            sentence_initial_only: !cluster.mentions().is_empty()
                && cluster.mentions().iter().all(|m| m.sentence_initial),
            token_count: core,
            has_title_prefix: raw > core,
            mention_count: cluster.mention_count(),
        }
    }
}

/// Why an entity got its tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TierReason {
    /// Replacement or control character in the name.
    EncodingIssues,
    /// Looks like the tail of a cut-off token.
    TruncatedArtifact,
    /// Looks like a clause, not a name.
    SentenceFragment,
    /// Blocklisted common word.
    CommonWord,
    /// Promoted by NER support.
    NerBacked,
    /// Promoted for having several tokens.
    MultiTokenName,
    /// Promoted for an honorific prefix.
    TitlePrefix,
    /// Promoted for repeated mentions.
    MultipleMentions,
    /// Demoted: one capitalized word seen only at sentence starts.
    SentenceInitialSingleToken,
    /// Base tier straight from the confidence value.
    Confidence(f64),
}

impl fmt::Display for TierReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierReason::EncodingIssues => f.write_str("encoding_issues"),
            TierReason::TruncatedArtifact => f.write_str("truncated_artifact"),
            TierReason::SentenceFragment => f.write_str("sentence_fragment"),
            TierReason::CommonWord => f.write_str("common_word"),
            TierReason::NerBacked => f.write_str("ner_backed"),
            TierReason::MultiTokenName => f.write_str("multi_token_name"),
            TierReason::TitlePrefix => f.write_str("title_prefix"),
            TierReason::MultipleMentions => f.write_str("multiple_mentions"),
            TierReason::SentenceInitialSingleToken => f.write_str("sentence_initial_single_token"),
            TierReason::Confidence(value) => write!(f, "confidence_{value:.2}"),
        }
    }
}

/// Tier plus the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierAssignment {
    /// Assigned tier.
    pub tier: Tier,
    /// Deciding rule.
    pub reason: TierReason,
}

impl TierAssignment {
    const fn new(tier: Tier, reason: TierReason) -> Self {
        Self { tier, reason }
    }
}

// =============================================================================
// Demotion predicates
// =============================================================================

/// U+FFFD or any control character.
#[must_use]
pub fn has_encoding_issues(name: &str) -> bool {
    name.chars().any(|c| c == '\u{FFFD}' || c.is_control())
}

/// A short lower-case leading token followed by more ("ry Potter"), or a
/// name of at most two characters that is not a capital initial ("J.").
#[must_use]
pub fn is_truncated_artifact(name: &str) -> bool {
    let words = tokens(name);
    let Some(first) = words.first() else {
        return false;
    };
    if words.len() > 1 && first.chars().count() <= 2 && is_lowercase_word(first) {
        return true;
    }
    let trimmed = name.trim();
    trimmed.chars().count() <= 2 && !is_initial(trimmed)
}

fn is_initial(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(c), None, None) | (Some(c), Some('.'), None) => c.is_uppercase(),
        _ => false,
    }
}

/// Starts with a bare function word and is short ("and then Frodo"), ends
/// in a lower-case verb-like token ("Frodo walked"), or is "The" plus a
/// verb-like token ("The Burning").
#[must_use]
pub fn is_sentence_fragment(name: &str) -> bool {
    let words = tokens(name);
    let (Some(first), Some(last)) = (words.first(), words.last()) else {
        return false;
    };
    if lexicon::is_function_word(first) && words.len() <= 3 {
        return true;
    }
    if is_lowercase_word(last) && lexicon::has_verb_suffix(last) {
        return true;
    }
    words.len() == 2 && *first == "The" && lexicon::has_verb_suffix(words[1])
}

/// Blocklisted common word, or a single common lower-case word typed as
/// SPELL/MATERIAL/MAGIC.
#[must_use]
pub fn is_common_word_name(name: &str, entity_type: &EntityType) -> bool {
    if lexicon::is_common_word(name) {
        return true;
    }
    let words = tokens(name);
    entity_type.is_lexical_kind()
        && words.len() == 1
        && is_lowercase_word(words[0])
        && lexicon::is_common_lowercase(words[0])
}

fn quality_demotion(name: &str, entity_type: &EntityType) -> Option<TierReason> {
    if has_encoding_issues(name) {
        Some(TierReason::EncodingIssues)
    } else if is_truncated_artifact(name) {
        Some(TierReason::TruncatedArtifact)
    } else if is_sentence_fragment(name) {
        Some(TierReason::SentenceFragment)
    } else if is_common_word_name(name, entity_type) {
        Some(TierReason::CommonWord)
    } else {
        None
    }
}

// =============================================================================
// Assignment
// =============================================================================

/// Base tier from the confidence thresholds alone.
#[must_use]
pub fn base_tier(confidence: f64, config: &TierConfig) -> Tier {
    if confidence >= config.tier_a_threshold {
        Tier::A
    } else if confidence >= config.tier_b_threshold {
        Tier::B
    } else {
        // 0.30 and up, and everything below it, land in the same bucket.
        Tier::C
    }
}

/// Assign a tier to a name with the given confidence and features.
#[must_use]
pub fn assign_tier(
    name: &str,
    entity_type: &EntityType,
    confidence: f64,
    features: &TierFeatures,
    config: &TierConfig,
) -> TierAssignment {
    if let Some(reason) = quality_demotion(name, entity_type) {
        return TierAssignment::new(Tier::C, reason);
    }

    let base = base_tier(confidence, config);

    if features.has_ner_support && base != Tier::A {
        return TierAssignment::new(Tier::A, TierReason::NerBacked);
    }
    if base == Tier::C {
        if features.token_count > 1 {
            return TierAssignment::new(Tier::B, TierReason::MultiTokenName);
        }
        if features.has_title_prefix {
            return TierAssignment::new(Tier::B, TierReason::TitlePrefix);
        }
        if features.mention_count >= config.promotion_mention_count {
            return TierAssignment::new(Tier::B, TierReason::MultipleMentions);
        }
    }

    if features.sentence_initial_only
        && features.token_count == 1
        && !features.has_title_prefix
        && !features.has_ner_support
        && base != Tier::C
    {
        return TierAssignment::new(Tier::C, TierReason::SentenceInitialSingleToken);
    }

    TierAssignment::new(base, TierReason::Confidence(confidence))
}

/// Assign a tier to a cluster from its canonical, type and confidence.
#[must_use]
pub fn assign_entity_tier(
    cluster: &EntityCluster,
    features: &TierFeatures,
    config: &TierConfig,
) -> TierAssignment {
    assign_tier(
        cluster.canonical(),
        cluster.entity_type(),
        cluster.confidence().get(),
        features,
        config,
    )
}

// =============================================================================
// Tier policy
// =============================================================================

/// Outcome of [`can_merge_by_tier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierMergeDecision {
    /// Whether the two entities may merge.
    pub can_merge: bool,
    /// Short explanation.
    pub reason: &'static str,
}

/// TIER_C entities never merge with anything; A and B merge freely.
#[must_use]
pub fn can_merge_by_tier(a: Tier, b: Tier) -> TierMergeDecision {
    if a == Tier::C || b == Tier::C {
        TierMergeDecision {
            can_merge: false,
            reason: "tier_c_isolated",
        }
    } else {
        TierMergeDecision {
            can_merge: true,
            reason: "tiers_compatible",
        }
    }
}

/// Keep entities at or above `min` (`A < B < C`).
#[must_use]
pub fn filter_by_tier(entities: Vec<Entity>, min: Tier) -> Vec<Entity> {
    entities.into_iter().filter(|e| e.tier.meets(min)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(tokens: usize) -> TierFeatures {
        TierFeatures {
            token_count: tokens,
            mention_count: 1,
            ..TierFeatures::default()
        }
    }

    fn tier(name: &str, conf: f64, features: TierFeatures) -> TierAssignment {
        assign_tier(name, &EntityType::Person, conf, &features, &TierConfig::default())
    }

    #[test]
    fn encoding_issue_overrides_everything() {
        let mut f = plain(1);
        f.has_ner_support = true;
        let t = tier("Fro\u{FFFD}do", 0.95, f);
        assert_eq!(t.tier, Tier::C);
        assert_eq!(t.reason.to_string(), "encoding_issues");
    }

    #[test]
    fn truncated_shapes() {
        assert!(is_truncated_artifact("ry Potter"));
        assert!(is_truncated_artifact("Al"));
        assert!(!is_truncated_artifact("J."));
        assert!(!is_truncated_artifact("J"));
        assert!(!is_truncated_artifact("Harry Potter"));
        assert_eq!(tier("ry Potter", 0.9, plain(2)).reason, TierReason::TruncatedArtifact);
    }

    #[test]
    fn fragment_shapes() {
        assert!(is_sentence_fragment("and Frodo"));
        assert!(is_sentence_fragment("Frodo walked"));
        assert!(is_sentence_fragment("The Burning"));
        assert!(!is_sentence_fragment("Frodo Baggins"));
        assert!(!is_sentence_fragment("And then there were none at all"));
        assert_eq!(tier("Sam walked", 0.9, plain(2)).reason, TierReason::SentenceFragment);
    }

    #[test]
    fn common_word_shapes() {
        assert!(is_common_word_name("Finally", &EntityType::Person));
        assert!(is_common_word_name("fire", &EntityType::Spell));
        assert!(!is_common_word_name("fire", &EntityType::Person));
        assert!(!is_common_word_name("Fire", &EntityType::Spell));
        assert_eq!(tier("Suddenly", 0.9, plain(1)).reason, TierReason::CommonWord);
    }

    #[test]
    fn base_thresholds() {
        let config = TierConfig::default();
        assert_eq!(base_tier(0.70, &config), Tier::A);
        assert_eq!(base_tier(0.69, &config), Tier::B);
        assert_eq!(base_tier(0.50, &config), Tier::B);
        assert_eq!(base_tier(0.35, &config), Tier::C);
        assert_eq!(base_tier(0.05, &config), Tier::C);
    }

    #[test]
    fn ner_promotes_to_a() {
        let mut f = plain(1);
        f.has_ner_support = true;
        let t = tier("Frodo", 0.4, f);
        assert_eq!(t.tier, Tier::A);
        assert_eq!(t.reason, TierReason::NerBacked);
    }

    #[test]
    fn c_promotions_in_order() {
        assert_eq!(tier("Frodo Baggins", 0.4, plain(2)).reason, TierReason::MultiTokenName);

        let mut titled = plain(1);
        titled.has_title_prefix = true;
        assert_eq!(tier("Frodo", 0.4, titled).reason, TierReason::TitlePrefix);

        let mut repeated = plain(1);
        repeated.mention_count = 3;
        let t = tier("Frodo", 0.4, repeated);
        assert_eq!((t.tier, t.reason), (Tier::B, TierReason::MultipleMentions));
    }

    #[test]
    fn promotions_only_raise() {
        // multi-token does not pull a B down or push it up
        let t = tier("Frodo Baggins", 0.6, plain(2));
        assert_eq!(t.tier, Tier::B);
        assert_eq!(t.reason.to_string(), "confidence_0.60");
    }

    #[test]
    fn sentence_initial_single_token_demotes() {
        let mut f = plain(1);
        f.sentence_initial_only = true;
        let t = tier("Frodo", 0.8, f);
        assert_eq!((t.tier, t.reason), (Tier::C, TierReason::SentenceInitialSingleToken));

        f.has_ner_support = true;
        assert_eq!(tier("Frodo", 0.8, f).tier, Tier::A);
    }

    #[test]
    fn titled_name_counts_one_name_token() {
        use crate::{ClusterArena, EntityId, Mention, MentionType, Provenance};

        let mut arena = ClusterArena::new();
        let mid = arena.allocate_mention_id();
        let m = Mention::new(
            mid,
            EntityId(0),
            (0, 9),
            "Mr. Smith",
            0,
            MentionType::Canonical,
            Provenance::Fallback,
            0.9,
        );
        let id = arena.create(EntityType::Person, "Mr. Smith", m, [Provenance::Fallback], 0.4);
        let cluster = arena.get(id).unwrap();

        let f = TierFeatures::from_cluster(cluster);
        assert_eq!(f.token_count, 1);
        assert!(f.has_title_prefix);

        let t = assign_entity_tier(cluster, &f, &TierConfig::default());
        assert_eq!((t.tier, t.reason), (Tier::B, TierReason::TitlePrefix));
    }

    #[test]
    fn titled_name_escapes_sentence_initial_demotion() {
        let mut f = plain(1);
        f.sentence_initial_only = true;
        f.has_title_prefix = true;
        let t = tier("Mr. Smith", 0.8, f);
        assert_eq!(t.tier, Tier::A);
    }

    #[test]
    fn confidence_reason_format() {
        let t = tier("Frodo", 0.734, plain(1));
        assert_eq!(t.tier, Tier::A);
        assert_eq!(t.reason.to_string(), "confidence_0.73");
    }

    #[test]
    fn tier_c_is_isolated() {
        assert!(!can_merge_by_tier(Tier::C, Tier::A).can_merge);
        assert!(!can_merge_by_tier(Tier::B, Tier::C).can_merge);
        assert!(can_merge_by_tier(Tier::A, Tier::B).can_merge);
    }
}
