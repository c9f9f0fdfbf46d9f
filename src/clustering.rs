//! Incremental clustering and canonicalization.
//!
//! Spans arrive one at a time, in ingestion order. Each accepted span either
//! joins the first same-type cluster it variant-matches (possibly upgrading
//! that cluster's canonical name) or seeds a new cluster. Every name a
//! cluster learns is also registered in the run's [`AliasRegistry`] with a
//! strength relative to the cluster's canonical, for the disambiguation
//! pass that follows.
//!
//! ```rust
//! use nomina::clustering::ClusteringEngine;
//! use nomina::context::SentenceIndex;
//! use nomina::normalize::{DefaultNormalizer, EnglishPronouns};
//! use nomina::{CandidateSpan, EntityType, Provenance, ResolverConfig};
//!
//! let config = ResolverConfig::default();
//! let sentences = SentenceIndex::default();
//! let mut engine = ClusteringEngine::new(&config, &DefaultNormalizer, &EnglishPronouns, &sentences);
//! engine.ingest(&CandidateSpan::new("Gandalf", EntityType::Person, 0, 7, Provenance::Ner));
//! engine.ingest(&CandidateSpan::new("Gandalf the Grey", EntityType::Person, 20, 36, Provenance::Dep));
//!
//! let done = engine.finish();
//! let gandalf = done.arena.live().next().unwrap();
//! assert_eq!(gandalf.canonical(), "Gandalf the Grey");
//! assert_eq!(gandalf.aliases(), ["Gandalf".to_string()]);
//! assert_eq!(done.report.accepted, 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::alias::{classify_alias, derived_short_forms, AliasRegistry, AliasStrength};
use crate::config::ResolverConfig;
use crate::confidence::compute_mention_confidence;
use crate::context::SentenceIndex;
use crate::normalize::{is_lowercase_word, is_possessive, tokens, NameNormalizer, PronounClassifier};
use crate::variant::{has_descriptor_clause, is_variant_match, should_promote};
use crate::{CandidateSpan, ClusterArena, EntityId, Mention, MentionType};

/// What happened to the spans of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Spans offered.
    pub seen: usize,
    /// Spans with a usable name that became (or collapsed into) a mention.
    pub accepted: usize,
    /// Dropped: `start >= end` or past the end of the text.
    pub rejected_bounds: usize,
    /// Dropped: the surface is a pronoun.
    pub pronoun_vetoed: usize,
    /// Normalized to an empty name. Such a span never names a cluster; it
    /// becomes a mention of a same-type cluster with a mention around it,
    /// or is handed back unattached.
    pub empty_normalized: usize,
}

/// Everything an engine built.
#[derive(Debug, Default)]
pub struct Clustered {
    /// Clusters.
    pub arena: ClusterArena,
    /// Alias registry for the disambiguation pass.
    pub registry: AliasRegistry,
    /// Span accounting.
    pub report: IngestReport,
    /// Empty-named spans no cluster covers, in ingestion order.
    pub unnamed: Vec<CandidateSpan>,
}

/// Outcome of ingesting one span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Joined an existing cluster.
    Joined(EntityId),
    /// Seeded a new cluster.
    Created(EntityId),
    /// Empty name and no cluster around it yet; held for [`ClusteringEngine::finish`].
    Unnamed,
    /// Not turned into a mention.
    Skipped,
}

/// Builds clusters from a span stream. One engine per resolution run.
pub struct ClusteringEngine<'a> {
    config: &'a ResolverConfig,
    normalizer: &'a dyn NameNormalizer,
    pronouns: &'a dyn PronounClassifier,
    sentences: &'a SentenceIndex,
    text_len: Option<usize>,
    arena: ClusterArena,
    registry: AliasRegistry,
    report: IngestReport,
    unnamed: Vec<CandidateSpan>,
}

impl<'a> ClusteringEngine<'a> {
    /// Create an engine with an empty arena and registry.
    #[must_use]
    pub fn new(
        config: &'a ResolverConfig,
        normalizer: &'a dyn NameNormalizer,
        pronouns: &'a dyn PronounClassifier,
        sentences: &'a SentenceIndex,
    ) -> Self {
        Self {
            config,
            normalizer,
            pronouns,
            sentences,
            text_len: None,
            arena: ClusterArena::new(),
            registry: AliasRegistry::new(),
            report: IngestReport::default(),
            unnamed: Vec::new(),
        }
    }

    /// Reject spans ending past `text_len` characters.
    #[must_use]
    pub fn with_text_len(mut self, text_len: usize) -> Self {
        self.text_len = Some(text_len);
        self
    }

    /// Clusters built so far.
    #[must_use]
    pub fn arena(&self) -> &ClusterArena {
        &self.arena
    }

    /// Ingest every span, in order.
    pub fn ingest_all<'s>(&mut self, spans: impl IntoIterator<Item = &'s CandidateSpan>) {
        for span in spans {
            self.ingest(span);
        }
    }

    /// Ingest one span.
    pub fn ingest(&mut self, span: &CandidateSpan) -> IngestOutcome {
        self.report.seen += 1;

        let in_bounds = match self.text_len {
            Some(len) => span.is_within(len),
            None => span.start < span.end,
        };
        if !in_bounds {
            log::debug!(
                "[cluster] discarding out-of-bounds span '{}' [{}, {})",
                span.text,
                span.start,
                span.end
            );
            self.report.rejected_bounds += 1;
            return IngestOutcome::Skipped;
        }

        if self.pronouns.is_pronoun(span.text.trim()) {
            log::debug!("[cluster] pronoun veto: '{}'", span.text);
            self.report.pronoun_vetoed += 1;
            return IngestOutcome::Skipped;
        }

        let clean = self.normalizer.clean(&span.text);
        if clean.is_empty() {
            self.report.empty_normalized += 1;
            return self.attach_unnamed(span);
        }

        let outcome = match self.find_variant(span, &clean) {
            Some(id) => {
                self.join(id, span, &clean);
                IngestOutcome::Joined(id)
            }
            None => IngestOutcome::Created(self.create(span, &clean)),
        };
        self.report.accepted += 1;
        outcome
    }

    /// Hand back what was built. Held empty-named spans get one more
    /// chance at a cluster that appeared after them; the rest come back in
    /// [`Clustered::unnamed`].
    #[must_use]
    pub fn finish(mut self) -> Clustered {
        let held = std::mem::take(&mut self.unnamed);
        let unnamed: Vec<CandidateSpan> = held
            .into_iter()
            .filter(|span| match self.container_of(span) {
                Some(id) => {
                    self.attach(id, span);
                    false
                }
                None => true,
            })
            .collect();
        for span in &unnamed {
            log::debug!(
                "[cluster] '{}' [{}, {}) has no name and no owner; kept unattached",
                span.text,
                span.start,
                span.end
            );
        }
        Clustered {
            arena: self.arena,
            registry: self.registry,
            report: self.report,
            unnamed,
        }
    }

    // -------------------------------------------------------------------------
    // Matching
    // -------------------------------------------------------------------------

    /// First live same-type cluster whose canonical or an alias variant-matches.
    fn find_variant(&self, span: &CandidateSpan, clean: &str) -> Option<EntityId> {
        self.arena
            .live()
            .filter(|c| *c.entity_type() == span.entity_type)
            .find(|c| {
                is_variant_match(clean, c.canonical())
                    || c.aliases().iter().any(|a| is_variant_match(clean, a))
            })
            .map(|c| c.id())
    }

    // -------------------------------------------------------------------------
    // Cluster updates
    // -------------------------------------------------------------------------

    fn join(&mut self, id: EntityId, span: &CandidateSpan, clean: &str) {
        let Some(cluster) = self.arena.get(id) else {
            return;
        };
        let current = cluster.canonical().to_string();

        if should_promote(&current, clean) {
            log::debug!("[cluster] {} canonical '{}' -> '{}'", id, current, clean);
            if let Some(cluster) = self.arena.get_mut(id) {
                cluster.set_canonical(clean);
            }
            self.register_canonical(id);
            // The demoted name is re-classified against the new canonical.
            self.register_alias(id, &current);
        } else {
            self.register_alias(id, clean);
        }

        let mention = self.mention(id, span, clean);
        if let Some(cluster) = self.arena.get_mut(id) {
            cluster.add_source(span.provenance);
            if !cluster.add_mention(mention) {
                log::debug!(
                    "[cluster] {} already holds [{}, {})",
                    id,
                    span.start,
                    span.end
                );
            }
        }
    }

    fn create(&mut self, span: &CandidateSpan, clean: &str) -> EntityId {
        let id = self.arena.next_id();
        let mention = self.mention(id, span, clean);
        let confidence = self.config.confidence.base_score(span.provenance);
        let id = self.arena.create(
            span.entity_type.clone(),
            clean,
            mention,
            [span.provenance],
            confidence,
        );
        log::debug!("[cluster] {} new {} '{}'", id, span.entity_type, clean);
        self.register_canonical(id);
        id
    }

    /// A span with no usable name still counts as a mention of a same-type
    /// cluster that already has a mention around it. Without one it is held,
    /// never used as a name.
    fn attach_unnamed(&mut self, span: &CandidateSpan) -> IngestOutcome {
        match self.container_of(span) {
            Some(id) => {
                self.attach(id, span);
                IngestOutcome::Joined(id)
            }
            None => {
                log::debug!("[cluster] '{}' normalizes to nothing; held", span.text);
                self.unnamed.push(span.clone());
                IngestOutcome::Unnamed
            }
        }
    }

    fn container_of(&self, span: &CandidateSpan) -> Option<EntityId> {
        self.arena
            .live()
            .filter(|c| *c.entity_type() == span.entity_type)
            .find(|c| {
                c.mentions()
                    .iter()
                    .any(|m| m.start <= span.start && span.end <= m.end)
            })
            .map(|c| c.id())
    }

    fn attach(&mut self, id: EntityId, span: &CandidateSpan) {
        let mention = self.mention(id, span, "");
        if let Some(cluster) = self.arena.get_mut(id) {
            cluster.add_source(span.provenance);
            cluster.add_mention(mention);
        }
    }

    fn mention(&mut self, owner: EntityId, span: &CandidateSpan, clean: &str) -> Mention {
        let mention_type = self.mention_type(owner, span, clean);
        let confidence = compute_mention_confidence(&span.text, mention_type, &self.config.confidence);
        let id = self.arena.allocate_mention_id();
        Mention::new(
            id,
            owner,
            (span.start, span.end),
            span.text.clone(),
            self.sentences.sentence_of(span.start),
            mention_type,
            span.provenance,
            confidence.get(),
        )
        .with_sentence_initial(self.sentences.is_sentence_initial(span.start))
    }

    fn mention_type(&self, owner: EntityId, span: &CandidateSpan, clean: &str) -> MentionType {
        if is_possessive(&span.text) {
            return MentionType::Possessive;
        }
        let words = tokens(clean);
        if clean.is_empty()
            || has_descriptor_clause(clean)
            || words.first().is_some_and(|w| is_lowercase_word(w))
        {
            return MentionType::Descriptor;
        }
        match self.arena.get(owner) {
            Some(c) if !c.canonical().eq_ignore_ascii_case(clean) => MentionType::ShortForm,
            _ => MentionType::Canonical,
        }
    }

    // -------------------------------------------------------------------------
    // Alias registry
    // -------------------------------------------------------------------------

    /// Register the canonical under its own key, plus its derived short forms.
    fn register_canonical(&mut self, id: EntityId) {
        let Some(cluster) = self.arena.get(id) else {
            return;
        };
        let canonical = cluster.canonical().to_string();
        self.registry.register(
            self.normalizer.comparison_key(&canonical),
            id,
            AliasStrength::Strong,
        );
        if self.config.alias.derive_short_forms {
            for (key, strength) in derived_short_forms(&canonical) {
                self.registry.register(key, id, strength);
            }
        }
    }

    /// Classify `alias` against the cluster's canonical; record it on the
    /// cluster and in the registry, or reject it.
    fn register_alias(&mut self, id: EntityId, alias: &str) {
        let Some(cluster) = self.arena.get_mut(id) else {
            return;
        };
        if cluster.canonical().eq_ignore_ascii_case(alias) {
            return;
        }
        match classify_alias(alias, cluster.canonical()) {
            Some(strength) => {
                cluster.add_alias(alias);
                let key = self.normalizer.comparison_key(alias);
                self.registry.register(key, id, strength);
            }
            None => {
                log::debug!(
                    "[cluster] {} rejects alias '{}' of '{}'",
                    id,
                    alias,
                    cluster.canonical()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{DefaultNormalizer, EnglishPronouns};
    use crate::{EntityType, Provenance};

    fn run(spans: &[CandidateSpan]) -> (ClusterArena, AliasRegistry, IngestReport) {
        let done = run_all(spans);
        (done.arena, done.registry, done.report)
    }

    fn run_all(spans: &[CandidateSpan]) -> Clustered {
        let config = ResolverConfig::default();
        let sentences = SentenceIndex::default();
        let mut engine =
            ClusteringEngine::new(&config, &DefaultNormalizer, &EnglishPronouns, &sentences);
        engine.ingest_all(spans);
        engine.finish()
    }

    fn person(text: &str, start: usize, provenance: Provenance) -> CandidateSpan {
        CandidateSpan::new(text, EntityType::Person, start, start + text.len(), provenance)
    }

    #[test]
    fn epithet_upgrades_canonical() {
        let (arena, _, _) = run(&[
            person("Gandalf", 0, Provenance::Ner),
            person("Gandalf the Grey", 20, Provenance::Dep),
        ]);
        let live: Vec<_> = arena.live().collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].canonical(), "Gandalf the Grey");
        assert_eq!(live[0].aliases(), ["Gandalf".to_string()]);
        assert_eq!(live[0].sources().len(), 2);
    }

    #[test]
    fn shorter_variant_becomes_alias() {
        let (arena, registry, _) = run(&[
            person("Gandalf the Grey", 0, Provenance::Dep),
            person("Gandalf", 30, Provenance::Ner),
        ]);
        let c = arena.live().next().unwrap();
        assert_eq!(c.canonical(), "Gandalf the Grey");
        assert_eq!(c.mention_count(), 2);
        assert_eq!(c.mentions()[1].mention_type, MentionType::ShortForm);
        assert_eq!(registry.candidates("gandalf")[0].strength, AliasStrength::Strong);
    }

    #[test]
    fn titled_and_bare_surname_share_a_cluster() {
        let (arena, registry, _) = run(&[
            person("Smith", 0, Provenance::Fallback),
            person("Mr. Smith", 20, Provenance::Ner),
        ]);
        let c = arena.live().next().unwrap();
        assert_eq!(arena.live().count(), 1);
        assert_eq!(c.canonical(), "Mr. Smith");
        assert!(c.aliases().iter().any(|a| a == "Smith"));
        assert_eq!(registry.candidates("smith").len(), 1);
    }

    #[test]
    fn types_never_mix() {
        let (arena, _, _) = run(&[
            CandidateSpan::new("Hogwarts", EntityType::Place, 0, 8, Provenance::Ner),
            CandidateSpan::new("Hogwarts", EntityType::Organization, 0, 8, Provenance::Whitelist),
        ]);
        assert_eq!(arena.live().count(), 2);
    }

    #[test]
    fn duplicate_positions_collapse_but_sources_accumulate() {
        let (arena, _, report) = run(&[
            person("Frodo", 0, Provenance::Dep),
            person("Frodo", 0, Provenance::Ner),
        ]);
        let c = arena.live().next().unwrap();
        assert_eq!(c.mention_count(), 1);
        assert!(c.sources().contains(&Provenance::Ner));
        assert_eq!(report.accepted, 2);
    }

    #[test]
    fn unrelated_names_stay_apart() {
        let (arena, registry, _) = run(&[
            person("Harry Potter", 0, Provenance::Ner),
            person("Harry", 20, Provenance::Ner),
            person("Potter", 40, Provenance::Ner),
        ]);
        assert_eq!(arena.live().count(), 3);
        assert_eq!(registry.candidates("harry").len(), 2);
        let potter = registry.candidates("potter");
        assert!(potter
            .iter()
            .any(|c| c.owner == EntityId(0) && c.strength == AliasStrength::Ambiguous));
    }

    #[test]
    fn generic_title_does_not_absorb_name() {
        let (arena, _, _) = run(&[
            person("King", 0, Provenance::Ner),
            person("King of the North", 10, Provenance::Ner),
        ]);
        assert_eq!(arena.live().count(), 2);
    }

    #[test]
    fn rejections_are_counted() {
        let config = ResolverConfig::default();
        let sentences = SentenceIndex::default();
        let mut engine =
            ClusteringEngine::new(&config, &DefaultNormalizer, &EnglishPronouns, &sentences)
                .with_text_len(50);
        assert_eq!(engine.ingest(&person("Frodo", 48, Provenance::Ner)), IngestOutcome::Skipped);
        assert_eq!(
            engine.ingest(&CandidateSpan::new("Sam", EntityType::Person, 9, 9, Provenance::Ner)),
            IngestOutcome::Skipped
        );
        assert_eq!(engine.ingest(&person("He", 0, Provenance::Ner)), IngestOutcome::Skipped);
        assert_eq!(engine.ingest(&person("--", 3, Provenance::Ner)), IngestOutcome::Unnamed);
        let Clustered { arena, report, unnamed, .. } = engine.finish();
        assert!(arena.is_empty());
        assert_eq!(unnamed.len(), 1);
        assert_eq!(report.seen, 4);
        assert_eq!(report.rejected_bounds, 2);
        assert_eq!(report.pronoun_vetoed, 1);
        assert_eq!(report.empty_normalized, 1);
        assert_eq!(report.accepted, 0);
    }

    #[test]
    fn empty_name_inside_known_span_is_kept() {
        let (arena, _, report) = run(&[
            person("Frodo Baggins", 0, Provenance::Ner),
            CandidateSpan::new("'", EntityType::Person, 5, 6, Provenance::Fallback),
        ]);
        let c = arena.live().next().unwrap();
        assert_eq!(c.mention_count(), 2);
        assert_eq!(c.canonical(), "Frodo Baggins");
        assert_eq!(report.empty_normalized, 1);
        assert_eq!(report.accepted, 1);
    }

    #[test]
    fn empty_name_before_its_container_attaches_at_finish() {
        let done = run_all(&[
            CandidateSpan::new("'", EntityType::Person, 5, 6, Provenance::Dep),
            person("Frodo Baggins", 0, Provenance::Ner),
        ]);
        assert!(done.unnamed.is_empty());
        let c = done.arena.live().next().unwrap();
        assert_eq!(c.mention_count(), 2);
        assert_eq!(c.canonical(), "Frodo Baggins");
        assert!(c.aliases().is_empty());
    }

    #[test]
    fn empty_name_without_container_is_kept_unattached() {
        let stray = CandidateSpan::new("--", EntityType::Place, 30, 32, Provenance::Fallback);
        let done = run_all(&[person("Frodo Baggins", 0, Provenance::Ner), stray.clone()]);
        assert_eq!(done.unnamed, vec![stray]);
        assert_eq!(done.arena.live().count(), 1);
        assert_eq!(done.report.empty_normalized, 1);
        assert_eq!(done.report.accepted, 1);
    }

    #[test]
    fn canonical_never_regresses() {
        let (arena, _, _) = run(&[
            person("Aragorn son of Arathorn", 0, Provenance::Ner),
            person("Arathorn", 40, Provenance::Fallback),
            person("Aragorn son of Arathorn", 60, Provenance::Fallback),
        ]);
        let c = arena.live().next().unwrap();
        assert_eq!(c.canonical(), "Aragorn son of Arathorn");
        assert_eq!(c.mention_count(), 3);
    }
}
