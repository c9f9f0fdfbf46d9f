//! One resolution run, end to end.
//!
//! ```text
//! spans ─▶ clustering ─▶ alias folding ─▶ canonical re-rank + cross-type merge
//!       ─▶ filters ─▶ confidence, tier ─▶ confidence/tier filter
//!       ─▶ entities + span index + stats
//! ```
//!
//! A [`ResolutionSession`] holds only configuration and the text
//! collaborators; every run builds its own arena, alias registry and
//! timeline, so one session can resolve many documents, from several
//! threads at once.
//!
//! ```rust
//! use nomina::{CandidateSpan, EntityType, Provenance, ResolutionSession, Tier};
//!
//! let text = "Gandalf arrived. Gandalf the Grey said nothing.";
//! let spans = vec![
//!     CandidateSpan::new("Gandalf", EntityType::Person, 0, 7, Provenance::Ner),
//!     CandidateSpan::new("Gandalf the Grey", EntityType::Person, 17, 33, Provenance::Dep),
//! ];
//! let output = ResolutionSession::default().resolve_text(text, &spans);
//! assert_eq!(output.entities.len(), 1);
//! assert_eq!(output.entities[0].canonical, "Gandalf the Grey");
//! assert_eq!(output.entities[0].tier, Tier::A);
//! assert_eq!(output.span_index.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::alias::fold_single_token_clusters;
use crate::clustering::{Clustered, ClusteringEngine, IngestReport};
use crate::confidence::compute_entity_confidence_with_context;
use crate::config::ResolverConfig;
use crate::context::{MentionContext, SentenceIndex};
use crate::merge::{merge_and_filter, FilterReport};
use crate::normalize::{DefaultNormalizer, EnglishPronouns, NameNormalizer, PronounClassifier};
use crate::stats::ResolutionStats;
use crate::tier::{assign_entity_tier, filter_by_tier, TierFeatures};
use crate::{CandidateSpan, ClusterArena, Entity, EntityId, Result, SpanIndexEntry};

/// Characters of document text on each side of a mention searched for
/// strong naming context anchored on it.
const CONTEXT_RADIUS: usize = 40;

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOutput {
    /// Surviving entities in id order.
    pub entities: Vec<Entity>,
    /// Every surviving span, sorted by position.
    pub span_index: Vec<SpanIndexEntry>,
    /// Confidence distribution before the output filters.
    pub stats: ResolutionStats,
    /// Span-level accounting.
    pub ingest: IngestReport,
    /// What the merge and filter stage removed.
    pub filters: FilterReport,
    /// Spans whose name normalized to nothing and that no entity covers.
    /// They never name an entity but are not discarded.
    pub unnamed_spans: Vec<CandidateSpan>,
}

/// Resolves span batches into entities.
pub struct ResolutionSession {
    config: ResolverConfig,
    normalizer: Box<dyn NameNormalizer>,
    pronouns: Box<dyn PronounClassifier>,
}

impl Default for ResolutionSession {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl std::fmt::Debug for ResolutionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionSession")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResolutionSession {
    /// Session with the English default collaborators.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            normalizer: Box::new(DefaultNormalizer),
            pronouns: Box::new(EnglishPronouns),
        }
    }

    /// Session from a validated configuration.
    pub fn try_new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Replace the name normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Box<dyn NameNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Replace the pronoun classifier.
    #[must_use]
    pub fn with_pronoun_classifier(mut self, pronouns: Box<dyn PronounClassifier>) -> Self {
        self.pronouns = pronouns;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve spans with no document text. Only the upper-bound check and
    /// sentence features are lost.
    #[must_use]
    pub fn resolve(&self, spans: &[CandidateSpan]) -> ResolutionOutput {
        self.run(spans, None, &SentenceIndex::default())
    }

    /// Resolve spans positioned against `text`.
    #[must_use]
    pub fn resolve_text(&self, text: &str, spans: &[CandidateSpan]) -> ResolutionOutput {
        let sentences = SentenceIndex::from_text(text);
        self.run(spans, Some(text), &sentences)
    }

    /// Resolve spans against `text` using the caller's sentence starts.
    #[must_use]
    pub fn resolve_with_sentences(
        &self,
        text: &str,
        sentence_starts: Vec<usize>,
        spans: &[CandidateSpan],
    ) -> ResolutionOutput {
        let sentences = SentenceIndex::from_starts(sentence_starts);
        self.run(spans, Some(text), &sentences)
    }

    fn run(
        &self,
        spans: &[CandidateSpan],
        text: Option<&str>,
        sentences: &SentenceIndex,
    ) -> ResolutionOutput {
        let mut engine = ClusteringEngine::new(
            &self.config,
            self.normalizer.as_ref(),
            self.pronouns.as_ref(),
            sentences,
        );
        if let Some(text) = text {
            engine = engine.with_text_len(text.chars().count());
        }
        engine.ingest_all(spans);
        let Clustered {
            mut arena,
            mut registry,
            report: ingest,
            unnamed,
        } = engine.finish();

        let folded = fold_single_token_clusters(
            &mut arena,
            &mut registry,
            self.normalizer.as_ref(),
            self.config.alias.strong_recency_window,
        );
        let filters = merge_and_filter(&mut arena);

        let scored = self.finalize(&mut arena, text);
        let stats = ResolutionStats::from_entities(&scored);

        let mut entities = filter_entities_by_confidence(scored, self.config.filter.min_confidence);
        if let Some(min_tier) = self.config.filter.min_tier {
            entities = filter_by_tier(entities, min_tier);
        }
        let span_index = span_index(&arena, &entities);

        log::info!(
            "[session] {} spans -> {} entities ({} scored, {} folded mentions, {} cross-type merges)",
            ingest.seen,
            entities.len(),
            stats.total,
            folded,
            filters.cross_type_merges
        );

        ResolutionOutput {
            entities,
            span_index,
            stats,
            ingest,
            filters,
            unnamed_spans: unnamed,
        }
    }

    /// Score, tier, and emit every live cluster.
    fn finalize(&self, arena: &mut ClusterArena, text: Option<&str>) -> Vec<Entity> {
        let mut entities = Vec::new();
        for id in arena.live_ids() {
            let Some(cluster) = arena.get_mut(id) else {
                continue;
            };

            let windows: Vec<MentionContext> = text
                .map(|t| {
                    cluster
                        .mentions()
                        .iter()
                        .map(|m| MentionContext::around(t, m.start, m.end, CONTEXT_RADIUS))
                        .collect()
                })
                .unwrap_or_default();
            let confidence =
                compute_entity_confidence_with_context(cluster, &windows, &self.config.confidence);
            cluster.set_confidence(confidence);

            let features = TierFeatures::from_cluster(cluster);
            let assignment = assign_entity_tier(cluster, &features, &self.config.tier);
            let reason = assignment.reason.to_string();
            cluster.finalize(confidence, assignment.tier, reason.as_str());

            entities.push(Entity {
                id,
                entity_type: cluster.entity_type().clone(),
                canonical: cluster.canonical().to_string(),
                aliases: cluster.aliases().to_vec(),
                confidence,
                tier: assignment.tier,
                tier_reason: reason,
                mention_count: cluster.mention_count(),
                sources: cluster.sources().iter().copied().collect(),
            });
        }
        entities
    }
}

fn span_index(arena: &ClusterArena, entities: &[Entity]) -> Vec<SpanIndexEntry> {
    let mut index: Vec<SpanIndexEntry> = entities
        .iter()
        .filter_map(|e| arena.get(e.id))
        .flat_map(|c| {
            c.mentions().iter().map(move |m| SpanIndexEntry {
                start: m.start,
                end: m.end,
                entity_id: c.id(),
            })
        })
        .collect();
    index.sort();
    index
}

// =============================================================================
// Batch helpers
// =============================================================================

/// Keep entities whose confidence is at least `threshold`.
#[must_use]
pub fn filter_entities_by_confidence(entities: Vec<Entity>, threshold: f64) -> Vec<Entity> {
    entities
        .into_iter()
        .filter(|e| {
            let keep = e.confidence.get() >= threshold;
            if !keep {
                log::debug!(
                    "[session] {} '{}' below confidence {:.2} ({})",
                    e.id,
                    e.canonical,
                    threshold,
                    e.confidence
                );
            }
            keep
        })
        .collect()
}

/// Stable-sort spans into the conventional ingestion order: DEP, then NER,
/// then WHITELIST/PATTERN, then FALLBACK, each left to right.
#[must_use]
pub fn order_for_ingestion(mut spans: Vec<CandidateSpan>) -> Vec<CandidateSpan> {
    spans.sort_by_key(|s| (s.provenance.ingestion_rank(), s.start));
    spans
}

/// Parse a JSON array of spans.
///
/// ```rust
/// let spans = nomina::parse_spans_json(
///     r#"[{"text": "Bree", "entity_type": "PLACE", "start": 0, "end": 4, "provenance": "NER"}]"#,
/// ).unwrap();
/// assert_eq!(spans[0].text, "Bree");
/// ```
pub fn parse_spans_json(json: &str) -> Result<Vec<CandidateSpan>> {
    Ok(serde_json::from_str(json)?)
}

/// Id of the entity owning `(start, end)` in a span index.
#[must_use]
pub fn entity_at(span_index: &[SpanIndexEntry], start: usize, end: usize) -> Option<EntityId> {
    span_index
        .iter()
        .find(|e| e.start == start && e.end == end)
        .map(|e| e.entity_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityType, Provenance, Tier};

    fn span(text: &str, ty: EntityType, start: usize, provenance: Provenance) -> CandidateSpan {
        CandidateSpan::new(text, ty, start, start + text.chars().count(), provenance)
    }

    #[test]
    fn ingestion_order_is_stable() {
        let spans = vec![
            span("A", EntityType::Person, 9, Provenance::Fallback),
            span("B", EntityType::Person, 5, Provenance::Ner),
            span("C", EntityType::Person, 1, Provenance::Whitelist),
            span("D", EntityType::Person, 7, Provenance::Dep),
            span("E", EntityType::Person, 2, Provenance::Pattern),
            span("F", EntityType::Person, 1, Provenance::Pattern),
        ];
        let order: Vec<_> = order_for_ingestion(spans).into_iter().map(|s| s.text).collect();
        assert_eq!(order, ["D", "B", "C", "F", "E", "A"]);
    }

    #[test]
    fn bare_king_is_filtered() {
        let out = ResolutionSession::default().resolve(&[span("King", EntityType::Person, 0, Provenance::Ner)]);
        assert!(out.entities.is_empty());
        assert_eq!(out.filters.generic_titles, 1);
    }

    #[test]
    fn confidence_filter_drops_weak_entities() {
        let session = ResolutionSession::default();
        let out = session.resolve(&[
            span("Bree", EntityType::Place, 0, Provenance::Fallback),
            span("Frodo", EntityType::Person, 10, Provenance::Ner),
        ]);
        assert_eq!(out.stats.total, 2);
        assert_eq!(out.stats.filtered, 1);
        assert_eq!(out.entities.len(), 1);
        assert_eq!(out.entities[0].canonical, "Frodo");
        assert_eq!(out.span_index, vec![SpanIndexEntry { start: 10, end: 15, entity_id: out.entities[0].id }]);
    }

    #[test]
    fn min_tier_filter() {
        let config = ResolverConfig::default().with_min_confidence(0.0).with_min_tier(Tier::A);
        let out = ResolutionSession::new(config).resolve(&[
            span("Frodo", EntityType::Person, 0, Provenance::Ner),
            span("Minas Tirith", EntityType::Place, 10, Provenance::Fallback),
        ]);
        assert_eq!(out.entities.len(), 1);
        assert_eq!(out.entities[0].tier, Tier::A);
    }

    #[test]
    fn filter_by_confidence_threshold_is_inclusive() {
        let out = ResolutionSession::new(ResolverConfig::default().with_min_confidence(0.0))
            .resolve(&[span("Frodo", EntityType::Person, 0, Provenance::Ner)]);
        let threshold = out.entities[0].confidence.get();
        assert_eq!(filter_entities_by_confidence(out.entities.clone(), threshold).len(), 1);
        assert!(filter_entities_by_confidence(out.entities, threshold + 0.01).is_empty());
    }

    #[test]
    fn try_new_validates() {
        let mut config = ResolverConfig::default();
        config.tier.tier_a_threshold = 2.0;
        assert!(ResolutionSession::try_new(config).is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_spans_json("[{\"text\": 1}]").is_err());
        assert!(parse_spans_json("[]").unwrap().is_empty());
    }

    #[test]
    fn entity_lookup_by_span() {
        let out = ResolutionSession::default().resolve(&[span("Frodo", EntityType::Person, 3, Provenance::Ner)]);
        assert_eq!(entity_at(&out.span_index, 3, 8), Some(out.entities[0].id));
        assert_eq!(entity_at(&out.span_index, 0, 8), None);
    }
}
