//! Alias registry, mention timeline, and surname disambiguation.
//!
//! A bare single-token name ("Smith") may belong to any of several clusters.
//! Resolution uses mention order rather than character distance: every
//! mention of every cluster goes on one timeline sorted by start offset
//! (ties by cluster id), and an ambiguous occurrence goes to whichever
//! candidate was mentioned most recently before it.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use nomina::alias::{resolve_alias_with_context, AliasCandidate, AliasStrength};
//! use nomina::EntityId;
//!
//! let candidates = [
//!     AliasCandidate::new(EntityId(1), AliasStrength::Strong),
//!     AliasCandidate::new(EntityId(2), AliasStrength::Ambiguous),
//! ];
//! let last: BTreeMap<_, _> = [(EntityId(1), 12), (EntityId(2), 30)].into_iter().collect();
//! let winner = resolve_alias_with_context("smith", &candidates, 31, &last, 10);
//! assert_eq!(winner, Some(EntityId(2)));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::lexicon;
use crate::normalize::{core_tokens, NameNormalizer};
use crate::{ClusterArena, EntityId};

// =============================================================================
// Strength
// =============================================================================

/// How reliably an alias points at its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasStrength {
    /// Surname-only; may name several entities.
    Ambiguous,
    /// Multi-word, or the first name of its canonical.
    Strong,
}

/// Classify `alias` against the canonical it would be recorded under.
///
/// Multi-word aliases are strong. A single token is strong when it is the
/// canonical's first name and ambiguous when it is the surname (a titled
/// surname such as "Mr. Smith" counts as a surname). Anything else is not
/// an alias at all.
#[must_use]
pub fn classify_alias(alias: &str, canonical: &str) -> Option<AliasStrength> {
    let alias_tokens = core_tokens(alias);
    if alias_tokens.len() >= 2 {
        return Some(AliasStrength::Strong);
    }
    let word = fold(alias_tokens.first()?);
    let core = core_tokens(canonical);
    let (first, last) = (fold(core.first()?), fold(core.last()?));
    if core.len() == 1 {
        return (word == first).then_some(AliasStrength::Ambiguous);
    }
    if word == first {
        Some(AliasStrength::Strong)
    } else if word == last {
        Some(AliasStrength::Ambiguous)
    } else {
        None
    }
}

/// Short forms a multi-token canonical implies even if they were never
/// observed on their own: the first informative token (strong) and the
/// last token (ambiguous). Single-token canonicals imply nothing.
#[must_use]
pub fn derived_short_forms(canonical: &str) -> Vec<(String, AliasStrength)> {
    let core = core_tokens(canonical);
    if core.len() < 2 {
        return Vec::new();
    }
    let mut forms = Vec::with_capacity(2);
    if let Some(first) = core.iter().find(|t| !lexicon::is_connector(t)) {
        forms.push((fold(first), AliasStrength::Strong));
    }
    if let Some(last) = core.last() {
        let last = fold(last);
        if forms.iter().all(|(f, _)| *f != last) && !lexicon::is_connector(&last) {
            forms.push((last, AliasStrength::Ambiguous));
        }
    }
    forms
}

fn fold(token: &str) -> String {
    token.trim_end_matches('.').to_lowercase()
}

// =============================================================================
// Registry
// =============================================================================

/// One cluster that may own an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasCandidate {
    /// Owning cluster.
    pub owner: EntityId,
    /// How reliably the alias points at `owner`.
    pub strength: AliasStrength,
}

impl AliasCandidate {
    /// Create a candidate.
    #[must_use]
    pub const fn new(owner: EntityId, strength: AliasStrength) -> Self {
        Self { owner, strength }
    }
}

/// Normalized alias text -> every cluster that may own it.
///
/// Scoped to one resolution run.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    entries: BTreeMap<String, Vec<AliasCandidate>>,
}

impl AliasRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `owner` under `key`. A repeat registration keeps the stronger
    /// of the two strengths.
    pub fn register(&mut self, key: impl Into<String>, owner: EntityId, strength: AliasStrength) {
        let key = key.into();
        if key.is_empty() {
            return;
        }
        let list = self.entries.entry(key).or_default();
        match list.iter_mut().find(|c| c.owner == owner) {
            Some(existing) => existing.strength = existing.strength.max(strength),
            None => list.push(AliasCandidate::new(owner, strength)),
        }
    }

    /// Candidates for `key`, in registration order.
    #[must_use]
    pub fn candidates(&self, key: &str) -> &[AliasCandidate] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Re-point every entry of `from` at `to` after a merge.
    pub fn reassign(&mut self, from: EntityId, to: EntityId) {
        for list in self.entries.values_mut() {
            let mut moved = None;
            list.retain(|c| {
                if c.owner == from {
                    moved = Some(moved.map_or(c.strength, |s: AliasStrength| s.max(c.strength)));
                    false
                } else {
                    true
                }
            });
            if let Some(strength) = moved {
                match list.iter_mut().find(|c| c.owner == to) {
                    Some(existing) => existing.strength = existing.strength.max(strength),
                    None => list.push(AliasCandidate::new(to, strength)),
                }
            }
        }
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Timeline
// =============================================================================

/// One mention position on the global timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Start offset.
    pub start: usize,
    /// End offset.
    pub end: usize,
    /// Current owner.
    pub owner: EntityId,
}

/// Every mention of every live cluster, ordered by `(start, cluster id)`.
#[derive(Debug, Clone, Default)]
pub struct MentionTimeline {
    entries: Vec<TimelineEntry>,
}

impl MentionTimeline {
    /// Snapshot the live clusters of `arena`.
    #[must_use]
    pub fn build(arena: &ClusterArena) -> Self {
        let mut entries: Vec<TimelineEntry> = arena
            .live()
            .flat_map(|c| {
                c.mentions().iter().map(|m| TimelineEntry {
                    start: m.start,
                    end: m.end,
                    owner: c.id(),
                })
            })
            .collect();
        entries.sort_by_key(|e| (e.start, e.owner, e.end));
        Self { entries }
    }

    /// Entries in timeline order.
    #[must_use]
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Timeline index of the mention `owner` holds at `(start, end)`.
    #[must_use]
    pub fn index_of(&self, owner: EntityId, start: usize, end: usize) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.owner == owner && e.start == start && e.end == end)
    }

    /// Most recent index strictly before `index` owned by `owner`.
    #[must_use]
    pub fn last_before(&self, owner: EntityId, index: usize) -> Option<usize> {
        self.entries[..index.min(self.entries.len())]
            .iter()
            .rposition(|e| e.owner == owner)
    }

    /// Record that the entry at `index` now belongs to `owner`.
    pub fn reassign(&mut self, index: usize, owner: EntityId) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.owner = owner;
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no mention is on the timeline.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Pick the owner of one alias occurrence.
///
/// Only candidates with a recorded mention at or before
/// `current_mention_index` are eligible. Strong candidates whose last mention
/// lies within `strong_recency_window` steps form the preferred pool; when
/// there are none, every eligible candidate competes. The candidate
/// mentioned most recently wins; ties go to the stronger alias, then the
/// lower id.
#[must_use]
pub fn resolve_alias_with_context(
    alias: &str,
    candidates: &[AliasCandidate],
    current_mention_index: usize,
    last_mention_index: &BTreeMap<EntityId, usize>,
    strong_recency_window: usize,
) -> Option<EntityId> {
    let eligible: Vec<(AliasCandidate, usize)> = candidates
        .iter()
        .filter_map(|c| {
            last_mention_index
                .get(&c.owner)
                .filter(|&&last| last <= current_mention_index)
                .map(|&last| (*c, last))
        })
        .collect();

    let strong: Vec<(AliasCandidate, usize)> = eligible
        .iter()
        .copied()
        .filter(|(c, last)| {
            c.strength == AliasStrength::Strong
                && current_mention_index - last <= strong_recency_window
        })
        .collect();

    let pool = if strong.is_empty() { &eligible } else { &strong };
    let winner = pool
        .iter()
        .max_by_key(|(c, last)| (*last, c.strength, Reverse(c.owner)))
        .map(|(c, _)| c.owner);

    log::debug!(
        "[alias] '{}' at {} -> {:?} ({} eligible, {} strong)",
        alias,
        current_mention_index,
        winner,
        eligible.len(),
        strong.len()
    );
    winner
}

/// Fold single-token clusters into the clusters their name refers to.
///
/// Each mention of a single-token cluster is resolved on its own against
/// the registry entry for the cluster's name, so one bare surname can split
/// between two families. Candidates must share the cluster's entity type. A
/// candidate whose own mention contains the occurrence wins outright. A
/// cluster whose mentions all move away is merged into the last receiver.
///
/// Returns the number of mentions moved.
pub fn fold_single_token_clusters(
    arena: &mut ClusterArena,
    registry: &mut AliasRegistry,
    normalizer: &dyn NameNormalizer,
    strong_recency_window: usize,
) -> usize {
    let mut timeline = MentionTimeline::build(arena);
    let mut moved = 0;

    for id in arena.live_ids() {
        let Some(cluster) = arena.get(id) else {
            continue;
        };
        if cluster.is_retired() || core_tokens(cluster.canonical()).len() != 1 {
            continue;
        }
        let key = normalizer.comparison_key(cluster.canonical());
        let name = cluster.canonical().to_string();
        let entity_type = cluster.entity_type().clone();
        let candidates: Vec<AliasCandidate> = registry
            .candidates(&key)
            .iter()
            .copied()
            .filter(|c| {
                c.owner != id
                    && arena
                        .get(c.owner)
                        .is_some_and(|o| !o.is_retired() && *o.entity_type() == entity_type)
            })
            .collect();
        if candidates.is_empty() {
            continue;
        }

        let mut spans: Vec<(usize, usize)> = cluster.mentions().iter().map(|m| m.span()).collect();
        spans.sort_unstable();

        for (start, end) in spans {
            let Some(index) = timeline.index_of(id, start, end) else {
                continue;
            };
            let container = candidates.iter().map(|c| c.owner).find(|owner| {
                arena.get(*owner).is_some_and(|o| {
                    o.mentions()
                        .iter()
                        .any(|m| m.start <= start && end <= m.end && (m.start, m.end) != (start, end))
                })
            });
            let winner = container.or_else(|| {
                let last: BTreeMap<EntityId, usize> = candidates
                    .iter()
                    .filter_map(|c| timeline.last_before(c.owner, index).map(|i| (c.owner, i)))
                    .collect();
                resolve_alias_with_context(&key, &candidates, index, &last, strong_recency_window)
            });
            let Some(winner) = winner else {
                continue;
            };
            let emptied = arena.get(id).is_some_and(|c| c.mention_count() == 1);
            if arena.transfer_mention(id, winner, start, end) {
                timeline.reassign(index, winner);
                if let Some(receiver) = arena.get_mut(winner) {
                    receiver.add_alias(name.clone());
                }
                moved += 1;
                log::debug!("[alias] moved '{}' [{}, {}) {} -> {}", key, start, end, id, winner);
                if emptied {
                    registry.reassign(id, winner);
                }
            }
        }
    }
    moved
}
