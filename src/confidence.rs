//! Entity and mention confidence scoring.
//!
//! Entity confidence multiplies five factors and clamps the product into
//! [0, 1]:
//!
//! ```text
//! score = base(provenance) * mention_bonus * generic_penalty * context_bonus
//!         [* fallback_boost, only when every source is FALLBACK]
//! ```
//!
//! All constants come from [`ConfidenceConfig`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ConfidenceConfig;
use crate::context::MentionContext;
use crate::lexicon;
use crate::normalize::tokens;
use crate::variant::is_specific_multiword;
use crate::{Confidence, EntityCluster, MentionType, Provenance};

// =============================================================================
// Strong context
// =============================================================================

static NAMED_AS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:named|called|known as)\s+\p{Lu}").expect("static regex"));

static KINSHIP_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:[Ss]on|[Dd]aughter|[Bb]rother|[Ss]ister|[Ff]ather|[Mm]other|[Ww]ife|[Hh]usband|[Hh]eir|[Cc]hild)\s+of\s+\p{Lu}",
    )
    .expect("static regex")
});

static TITLED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:Mr|Mrs|Ms|Dr|Sir|Lady|Lord|King|Queen|Prince|Princess|Professor|Captain|Master|Madam)\.?\s+\p{Lu}",
    )
    .expect("static regex")
});

static POSSESSIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Lu}\w*['’]s\b").expect("static regex"));

static ACTION_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\p{Lu}\w*\s+(?:said|asked|replied|whispered|shouted|cried|answered|laughed|smiled|nodded|sighed|muttered|walked|ran|looked|turned)\b",
    )
    .expect("static regex")
});

/// True if `text` shows a strong naming signal: a named-as construction,
/// kinship-of, a titled name, possessive marking, or a capitalized word
/// followed by a narrative action verb.
#[must_use]
pub fn has_strong_context(text: &str) -> bool {
    [&NAMED_AS, &KINSHIP_OF, &TITLED_NAME, &POSSESSIVE, &ACTION_VERB]
        .iter()
        .any(|re| re.is_match(text))
}

/// True if some strong naming signal in the window overlaps or touches
/// the mention itself.
#[must_use]
pub fn has_anchored_context(context: &MentionContext) -> bool {
    [&NAMED_AS, &KINSHIP_OF, &TITLED_NAME, &POSSESSIVE, &ACTION_VERB]
        .iter()
        .any(|re| {
            re.find_iter(&context.text)
                .any(|m| context.touches(m.start(), m.end()))
        })
}

// =============================================================================
// Entity confidence
// =============================================================================

/// Confidence of a cluster, looking only at its mention surfaces for
/// context signals.
#[must_use]
pub fn compute_entity_confidence(cluster: &EntityCluster, config: &ConfidenceConfig) -> Confidence {
    compute_entity_confidence_with_context(cluster, &[], config)
}

/// Confidence of a cluster. `context` holds document windows around its
/// mentions; a cue in a window earns the context bonus only when it is
/// anchored on the mention.
#[must_use]
pub fn compute_entity_confidence_with_context(
    cluster: &EntityCluster,
    context: &[MentionContext],
    config: &ConfidenceConfig,
) -> Confidence {
    let base = cluster
        .sources()
        .iter()
        .map(|p| config.base_score(*p))
        .fold(0.0_f64, f64::max);

    let count = cluster.mention_count();
    let mention_bonus = (1.0 + config.mention_bonus_step * count as f64).min(config.mention_bonus_cap);

    let generic_penalty = generic_penalty(cluster, config);

    let strong = cluster
        .mentions()
        .iter()
        .any(|m| has_anchored_context(&MentionContext::bare(&m.surface)))
        || context.iter().any(has_anchored_context);
    let context_bonus = if strong { config.context_bonus } else { 1.0 };

    let mut score = base * mention_bonus * generic_penalty * context_bonus;

    if is_fallback_only(cluster) {
        score *= fallback_boost(cluster, config);
    }

    Confidence::saturating(score)
}

fn generic_penalty(cluster: &EntityCluster, config: &ConfidenceConfig) -> f64 {
    let words = tokens(cluster.canonical());
    if words.len() != 1 || !lexicon::is_generic_title(words[0]) {
        return 1.0;
    }
    if cluster.aliases().iter().any(|a| is_specific_multiword(a)) {
        config.generic_with_alias_penalty
    } else {
        config.generic_penalty
    }
}

fn is_fallback_only(cluster: &EntityCluster) -> bool {
    !cluster.sources().is_empty() && cluster.sources().iter().all(|p| *p == Provenance::Fallback)
}

/// Multiplier that keeps capitalization-only multi-word names above the
/// output threshold when no model-backed extractor saw them.
fn fallback_boost(cluster: &EntityCluster, config: &ConfidenceConfig) -> f64 {
    let words = tokens(cluster.canonical()).len();
    let mut boost = if words >= 3 {
        config.fallback_boost_three_words
    } else if words == 2 {
        config.fallback_boost_two_words
    } else if cluster.aliases().iter().any(|a| tokens(a).len() >= 2) {
        config.fallback_boost_multiword_alias
    } else {
        1.0
    };
    if cluster.mention_count() >= 2 {
        boost += config.fallback_boost_repeat;
    }
    if cluster.entity_type().is_collective() {
        boost += config.fallback_boost_collective;
    }
    boost.min(config.fallback_boost_cap)
}

// =============================================================================
// Mention confidence
// =============================================================================

/// Base score of a mention by how it refers to its entity.
#[must_use]
pub const fn mention_type_base(mention_type: MentionType) -> f64 {
    match mention_type {
        MentionType::Canonical => 0.95,
        MentionType::ShortForm => 0.85,
        MentionType::Possessive => 0.70,
        MentionType::Descriptor => 0.60,
        MentionType::Pronoun => 0.50,
    }
}

/// Confidence of one mention in isolation. Diagnostic only; never used for
/// filtering.
#[must_use]
pub fn compute_mention_confidence(
    surface: &str,
    mention_type: MentionType,
    config: &ConfidenceConfig,
) -> Confidence {
    let mut score = mention_type_base(mention_type);
    if has_strong_context(surface) {
        score *= config.context_bonus;
    }
    let words = tokens(surface);
    if words.len() == 1 && lexicon::is_generic_title(words[0]) {
        score *= 0.5;
    }
    Confidence::saturating(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClusterArena, EntityId, EntityType, Mention};

    fn cluster_with(
        name: &str,
        entity_type: EntityType,
        sources: &[Provenance],
        mentions: usize,
    ) -> EntityCluster {
        let mut arena = ClusterArena::new();
        let mention = |arena: &mut ClusterArena, i: usize| {
            let id = arena.allocate_mention_id();
            Mention::new(
                id,
                EntityId(0),
                (i * 100, i * 100 + name.len()),
                name,
                i,
                MentionType::Canonical,
                sources[0],
                0.9,
            )
        };
        let first = mention(&mut arena, 0);
        let id = arena.create(entity_type, name, first, sources.iter().copied(), 0.0);
        for i in 1..mentions {
            let m = mention(&mut arena, i);
            arena.get_mut(id).unwrap().add_mention(m);
        }
        arena.get(id).unwrap().clone()
    }

    #[test]
    fn whitelist_three_mentions_clamps_to_one() {
        let c = cluster_with("Harry Potter", EntityType::Person, &[Provenance::Whitelist], 3);
        let conf = compute_entity_confidence(&c, &ConfidenceConfig::default());
        assert!((conf.get() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn base_is_max_over_sources() {
        let config = ConfidenceConfig::default();
        let c = cluster_with(
            "Frodo Baggins",
            EntityType::Person,
            &[Provenance::Dep, Provenance::Fallback],
            1,
        );
        // 0.75 * 1.05
        assert!((compute_entity_confidence(&c, &config).get() - 0.7875).abs() < 1e-10);
    }

    #[test]
    fn bare_generic_title_falls_below_threshold() {
        let c = cluster_with("King", EntityType::Person, &[Provenance::Ner], 1);
        let conf = compute_entity_confidence(&c, &ConfidenceConfig::default());
        // 0.85 * 1.05 * 0.3
        assert!((conf.get() - 0.26775).abs() < 1e-10);
        assert!(conf.get() < 0.5);
    }

    #[test]
    fn generic_title_with_specific_alias_is_penalized_less() {
        let mut c = cluster_with("King", EntityType::Person, &[Provenance::Ner], 1);
        c.add_alias("King Arthur");
        let conf = compute_entity_confidence(&c, &ConfidenceConfig::default());
        assert!((conf.get() - 0.85 * 1.05 * 0.8).abs() < 1e-10);
    }

    #[test]
    fn pattern_counts_as_ner() {
        let c = cluster_with("Bree", EntityType::Place, &[Provenance::Pattern], 1);
        let conf = compute_entity_confidence(&c, &ConfidenceConfig::default());
        assert!((conf.get() - 0.85 * 1.05).abs() < 1e-10);
    }

    #[test]
    fn context_bonus_from_surface_or_window() {
        let config = ConfidenceConfig::default();
        let c = cluster_with("Harry's", EntityType::Person, &[Provenance::Dep], 1);
        assert!((compute_entity_confidence(&c, &config).get() - 0.75 * 1.05 * 1.1).abs() < 1e-10);

        let plain = cluster_with("Strider", EntityType::Person, &[Provenance::Dep], 1);
        let window = vec![MentionContext::around("a ranger known as Strider", 18, 25, 40)];
        let with = compute_entity_confidence_with_context(&plain, &window, &config);
        let without = compute_entity_confidence(&plain, &config);
        assert!(with.get() > without.get());
    }

    #[test]
    fn neighbour_cue_earns_no_bonus() {
        let config = ConfidenceConfig::default();
        let text = "Frodo waited. Sam said nothing.";

        let frodo = cluster_with("Frodo", EntityType::Person, &[Provenance::Dep], 1);
        let window = vec![MentionContext::around(text, 0, 5, 40)];
        let conf = compute_entity_confidence_with_context(&frodo, &window, &config);
        assert!((conf.get() - 0.7875).abs() < 1e-10);

        let sam = cluster_with("Sam", EntityType::Person, &[Provenance::Dep], 1);
        let window = vec![MentionContext::around(text, 14, 17, 40)];
        let conf = compute_entity_confidence_with_context(&sam, &window, &config);
        assert!((conf.get() - 0.75 * 1.05 * 1.1).abs() < 1e-10);
    }

    #[test]
    fn anchored_cues() {
        assert!(has_anchored_context(&MentionContext::around("a boy named Harry", 12, 17, 40)));
        assert!(has_anchored_context(&MentionContext::around("it was Frodo’s pack", 7, 12, 40)));
        assert!(!has_anchored_context(&MentionContext::around("Sam said hello to Frodo", 18, 23, 40)));
        assert!(has_anchored_context(&MentionContext::bare("Mr. Baggins")));
    }

    #[test]
    fn fallback_only_boost() {
        let config = ConfidenceConfig::default();
        let two = cluster_with("Minas Tirith", EntityType::Place, &[Provenance::Fallback], 1);
        // 0.40 * 1.05 * (1.3 + 0.05)
        assert!((compute_entity_confidence(&two, &config).get() - 0.567).abs() < 1e-10);

        let three = cluster_with(
            "Tom Bombadil Senior",
            EntityType::Person,
            &[Provenance::Fallback],
            4,
        );
        // 0.40 * 1.2 * (1.4 + 0.1)
        assert!((compute_entity_confidence(&three, &config).get() - 0.72).abs() < 1e-10);

        let single = cluster_with("Bree", EntityType::Person, &[Provenance::Fallback], 1);
        assert!((compute_entity_confidence(&single, &config).get() - 0.42).abs() < 1e-10);
    }

    #[test]
    fn boost_is_capped() {
        let config = ConfidenceConfig {
            fallback_boost_cap: 1.4,
            ..ConfidenceConfig::default()
        };
        let c = cluster_with("Shire Council Hall", EntityType::Organization, &[Provenance::Fallback], 2);
        // 1.4 + 0.1 + 0.05 capped at 1.4; 0.40 * 1.10 * 1.4
        assert!((compute_entity_confidence(&c, &config).get() - 0.616).abs() < 1e-10);
    }

    #[test]
    fn strong_context_patterns() {
        assert!(has_strong_context("a boy named Harry"));
        assert!(has_strong_context("Aragorn son of Arathorn"));
        assert!(has_strong_context("Mr. Baggins"));
        assert!(has_strong_context("Frodo’s"));
        assert!(has_strong_context("Sam said"));
        assert!(!has_strong_context("the old road"));
        assert!(!has_strong_context("named harry"));
    }

    #[test]
    fn mention_confidence_by_type() {
        let config = ConfidenceConfig::default();
        let c = compute_mention_confidence("Frodo", MentionType::Canonical, &config);
        assert!((c.get() - 0.95).abs() < 1e-10);
        let p = compute_mention_confidence("Frodo's", MentionType::Possessive, &config);
        assert!((p.get() - 0.77).abs() < 1e-10);
        let g = compute_mention_confidence("King", MentionType::ShortForm, &config);
        assert!((g.get() - 0.425).abs() < 1e-10);
    }
}
