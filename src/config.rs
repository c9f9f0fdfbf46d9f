//! Resolver configuration.
//!
//! Every constant that was tuned by hand lives here rather than in the
//! algorithms: the provenance base scores, the mention bonus, the generic
//! word penalties, the fallback-only boost, tier thresholds, the alias
//! recency window, and the output filters. All structs deserialize with
//! `#[serde(default)]`, so a JSON override only needs the fields it changes:
//!
//! ```rust
//! use nomina::ResolverConfig;
//!
//! let config = ResolverConfig::from_json(r#"{ "filter": { "min_confidence": 0.6 } }"#).unwrap();
//! assert_eq!(config.filter.min_confidence, 0.6);
//! assert_eq!(config.confidence.mention_bonus_cap, 1.2);
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Provenance, Result, Tier};

// =============================================================================
// Confidence
// =============================================================================

/// Constants of the entity confidence formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Base score for curated whitelist spans.
    pub whitelist_base: f64,
    /// Base score for NER spans. PATTERN spans use this too.
    pub ner_base: f64,
    /// Base score for dependency-pattern spans.
    pub dep_base: f64,
    /// Base score for capitalization-only fallback spans.
    pub fallback_base: f64,
    /// Bonus per distinct mention.
    pub mention_bonus_step: f64,
    /// Upper bound of the mention bonus multiplier.
    pub mention_bonus_cap: f64,
    /// Multiplier for a bare generic title ("King") with no specific alias.
    pub generic_penalty: f64,
    /// Multiplier for a bare generic title that has a multi-word specific alias.
    pub generic_with_alias_penalty: f64,
    /// Multiplier when a mention shows a strong naming context.
    pub context_bonus: f64,
    /// Fallback-only boost for a canonical of three or more words.
    pub fallback_boost_three_words: f64,
    /// Fallback-only boost for a two-word canonical.
    pub fallback_boost_two_words: f64,
    /// Fallback-only boost when some alias has two or more words.
    pub fallback_boost_multiword_alias: f64,
    /// Added to the fallback-only boost when mentioned at least twice.
    pub fallback_boost_repeat: f64,
    /// Added to the fallback-only boost for ORG/HOUSE/PLACE clusters.
    pub fallback_boost_collective: f64,
    /// Cap of the fallback-only boost.
    pub fallback_boost_cap: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            whitelist_base: 0.95,
            ner_base: 0.85,
            dep_base: 0.75,
            fallback_base: 0.40,
            mention_bonus_step: 0.05,
            mention_bonus_cap: 1.2,
            generic_penalty: 0.3,
            generic_with_alias_penalty: 0.8,
            context_bonus: 1.1,
            fallback_boost_three_words: 1.4,
            fallback_boost_two_words: 1.3,
            fallback_boost_multiword_alias: 1.2,
            fallback_boost_repeat: 0.1,
            fallback_boost_collective: 0.05,
            fallback_boost_cap: 1.5,
        }
    }
}

impl ConfidenceConfig {
    /// Base score for one provenance tag.
    #[must_use]
    pub fn base_score(&self, provenance: Provenance) -> f64 {
        match provenance {
            Provenance::Whitelist => self.whitelist_base,
            Provenance::Ner | Provenance::Pattern => self.ner_base,
            Provenance::Dep => self.dep_base,
            Provenance::Fallback => self.fallback_base,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("whitelist_base", self.whitelist_base),
            ("ner_base", self.ner_base),
            ("dep_base", self.dep_base),
            ("fallback_base", self.fallback_base),
            ("generic_penalty", self.generic_penalty),
            ("generic_with_alias_penalty", self.generic_with_alias_penalty),
        ] {
            unit_interval(name, value)?;
        }
        for (name, value) in [
            ("mention_bonus_cap", self.mention_bonus_cap),
            ("context_bonus", self.context_bonus),
            ("fallback_boost_cap", self.fallback_boost_cap),
        ] {
            if !value.is_finite() || value < 1.0 {
                return Err(Error::config(format!("{name} must be >= 1.0, got {value}")));
            }
        }
        if !self.mention_bonus_step.is_finite() || self.mention_bonus_step < 0.0 {
            return Err(Error::config("mention_bonus_step must be non-negative"));
        }
        Ok(())
    }
}

// =============================================================================
// Tier
// =============================================================================

/// Confidence thresholds of the base tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    /// At or above: TIER_A.
    pub tier_a_threshold: f64,
    /// At or above: TIER_B. Anything lower is TIER_C.
    pub tier_b_threshold: f64,
    /// Mention count that lifts a TIER_C name to TIER_B.
    pub promotion_mention_count: usize,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            tier_a_threshold: 0.70,
            tier_b_threshold: 0.50,
            promotion_mention_count: 3,
        }
    }
}

impl TierConfig {
    fn validate(&self) -> Result<()> {
        unit_interval("tier_a_threshold", self.tier_a_threshold)?;
        unit_interval("tier_b_threshold", self.tier_b_threshold)?;
        if self.tier_a_threshold < self.tier_b_threshold {
            return Err(Error::config("tier thresholds must be descending: a >= b"));
        }
        Ok(())
    }
}

// =============================================================================
// Alias
// =============================================================================

/// Alias disambiguation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    /// A `strong` candidate is preferred only if its most recent prior
    /// mention is at most this many timeline steps before the occurrence.
    pub strong_recency_window: usize,
    /// Register the first/last tokens of multi-token canonicals as alias
    /// keys even when they were never observed on their own.
    pub derive_short_forms: bool,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            strong_recency_window: 10,
            derive_short_forms: true,
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Output filters applied after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Entities below this confidence are dropped.
    pub min_confidence: f64,
    /// If set, entities worse than this tier are dropped.
    pub min_tier: Option<Tier>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            min_tier: None,
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Full configuration of one resolution session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Confidence formula constants.
    pub confidence: ConfidenceConfig,
    /// Tier thresholds.
    pub tier: TierConfig,
    /// Alias disambiguation.
    pub alias: AliasConfig,
    /// Output filters.
    pub filter: FilterConfig,
}

impl ResolverConfig {
    /// Parse a (partial) JSON configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value for range and consistency.
    pub fn validate(&self) -> Result<()> {
        self.confidence.validate()?;
        self.tier.validate()?;
        unit_interval("min_confidence", self.filter.min_confidence)?;
        Ok(())
    }

    /// Set the minimum output confidence (clamped into [0, 1]).
    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        let clamped = if min_confidence.is_nan() {
            0.0
        } else {
            min_confidence.clamp(0.0, 1.0)
        };
        if clamped != min_confidence {
            log::warn!(
                "[config] min_confidence {} clamped to {}",
                min_confidence,
                clamped
            );
        }
        self.filter.min_confidence = clamped;
        self
    }

    /// Keep only entities at or above `tier`.
    #[must_use]
    pub fn with_min_tier(mut self, tier: Tier) -> Self {
        self.filter.min_tier = Some(tier);
        self
    }

    /// Set the strong-candidate recency window.
    #[must_use]
    pub fn with_strong_recency_window(mut self, window: usize) -> Self {
        self.alias.strong_recency_window = window;
        self
    }
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}
