//! Diagnostic summary of a resolution run. Monitoring only; nothing reads
//! these numbers to make decisions.

use serde::{Deserialize, Serialize};

use crate::{ConfidenceBand, Entity};

/// Confidence distribution over every scored entity, before filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionStats {
    /// Entities scored.
    pub total: usize,
    /// Confidence >= 0.8.
    pub high: usize,
    /// 0.6 <= confidence < 0.8.
    pub medium: usize,
    /// 0.5 <= confidence < 0.6.
    pub low: usize,
    /// Confidence < 0.5.
    pub filtered: usize,
    /// Mean confidence, 0 when there are no entities.
    pub mean_confidence: f64,
}

impl ResolutionStats {
    /// Summarize `entities`.
    #[must_use]
    pub fn from_entities(entities: &[Entity]) -> Self {
        let mut stats = Self {
            total: entities.len(),
            ..Self::default()
        };
        let mut sum = 0.0;
        for entity in entities {
            let value = entity.confidence.get();
            sum += value;
            match entity.confidence.band() {
                ConfidenceBand::High => stats.high += 1,
                ConfidenceBand::Medium => stats.medium += 1,
                ConfidenceBand::Low => stats.low += 1,
                ConfidenceBand::Filtered => stats.filtered += 1,
            }
        }
        if stats.total > 0 {
            stats.mean_confidence = sum / stats.total as f64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Confidence, EntityId, EntityType, Tier};

    fn entity(conf: f64) -> Entity {
        Entity {
            id: EntityId(0),
            entity_type: EntityType::Person,
            canonical: "Frodo".into(),
            aliases: vec![],
            confidence: Confidence::saturating(conf),
            tier: Tier::B,
            tier_reason: String::new(),
            mention_count: 1,
            sources: vec![],
        }
    }

    #[test]
    fn buckets_and_mean() {
        let entities: Vec<_> = [0.95, 0.8, 0.7, 0.55, 0.5, 0.2].into_iter().map(entity).collect();
        let stats = ResolutionStats::from_entities(&entities);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.high, 2);
        assert_eq!(stats.medium, 1);
        assert_eq!(stats.low, 2);
        assert_eq!(stats.filtered, 1);
        assert!((stats.mean_confidence - 3.7 / 6.0).abs() < 1e-10);
    }

    #[test]
    fn empty_is_zero() {
        let stats = ResolutionStats::from_entities(&[]);
        assert_eq!(stats, ResolutionStats::default());
    }
}
