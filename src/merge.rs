//! Cross-type reconciliation and the final filters.
//!
//! Runs after clustering and alias folding, before scoring:
//!
//! 1. [`rerank_canonicals`]: every cluster takes the best of its known
//!    names as canonical, so the merge below compares final names.
//! 2. [`merge_cross_type`]: clusters with the same canonical (ignoring case)
//!    but different types collapse into the highest-priority type. A known
//!    organization typed ORG beats every other type. Steps 1 and 2 repeat
//!    until a pass merges nothing.
//! 3. [`apply_filters`], in order: stopwords, bare generic person titles,
//!    names shadowed by a longer surviving name, and subsumed spans.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::lexicon;
use crate::normalize::tokens;
use crate::variant::{informativeness, is_specific_multiword, select_canonical};
use crate::{ClusterArena, EntityCluster, EntityId, EntityType};

/// Counts of what the merge and filter stage removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    /// Clusters merged into a same-named cluster of another type.
    pub cross_type_merges: usize,
    /// Clusters dropped as stopwords.
    pub stopwords: usize,
    /// PERSON clusters dropped as bare generic titles.
    pub generic_titles: usize,
    /// Clusters dropped because a longer surviving name starts with theirs.
    pub prefix_shadowed: usize,
    /// Mentions dropped because a longer mention of the same entity holds them.
    pub subsumed_spans: usize,
}

// =============================================================================
// Cross-type merge
// =============================================================================

/// Give every live cluster the best of its canonical and aliases as
/// canonical. Returns the number of clusters whose canonical changed.
pub fn rerank_canonicals(arena: &mut ClusterArena) -> usize {
    let mut changed = 0;
    for id in arena.live_ids() {
        let Some(cluster) = arena.get_mut(id) else {
            continue;
        };
        let best = select_canonical(
            std::iter::once(cluster.canonical()).chain(cluster.aliases().iter().map(String::as_str)),
        )
        .map(str::to_string);
        if let Some(best) = best {
            if cluster.set_canonical(best.as_str()) {
                log::debug!("[merge] {} canonical re-ranked to '{}'", id, best);
                changed += 1;
            }
        }
    }
    changed
}

fn merge_rank(cluster: &EntityCluster) -> (bool, u8, Reverse<EntityId>) {
    let known_org = *cluster.entity_type() == EntityType::Organization
        && lexicon::is_known_organization(cluster.canonical());
    (
        known_org,
        cluster.entity_type().merge_priority(),
        Reverse(cluster.id()),
    )
}

/// Merge live clusters whose canonicals are equal ignoring case and whose
/// types differ. Returns the number of clusters merged away.
pub fn merge_cross_type(arena: &mut ClusterArena) -> usize {
    let mut groups: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
    for cluster in arena.live() {
        groups
            .entry(cluster.canonical().to_lowercase())
            .or_default()
            .push(cluster.id());
    }

    let mut merged = 0;
    for (name, ids) in groups {
        if ids.len() < 2 {
            continue;
        }
        let members: Vec<&EntityCluster> = ids.iter().filter_map(|id| arena.get(*id)).collect();
        let Some(first) = members.first() else {
            continue;
        };
        if members.iter().all(|c| c.entity_type() == first.entity_type()) {
            continue;
        }
        let Some(winner) = members.iter().max_by_key(|c| merge_rank(c)).map(|c| c.id()) else {
            continue;
        };
        for id in ids.into_iter().filter(|id| *id != winner) {
            if arena.merge(winner, id) {
                log::debug!("[merge] '{}': {} folded into {}", name, id, winner);
                merged += 1;
            }
        }
    }
    merged
}

// =============================================================================
// Filters
// =============================================================================

/// Canonical is on the stopword list.
#[must_use]
pub fn is_stopword_cluster(cluster: &EntityCluster) -> bool {
    lexicon::is_stopword(cluster.canonical())
}

/// PERSON named only by a generic title ("Professor") and with no specific
/// multi-word alias ("Professor McGonagall").
#[must_use]
pub fn is_bare_generic_person(cluster: &EntityCluster) -> bool {
    let words = tokens(cluster.canonical());
    *cluster.entity_type() == EntityType::Person
        && words.len() == 1
        && lexicon::is_generic_title(words[0])
        && !cluster.aliases().iter().any(|a| is_specific_multiword(a))
}

/// `longer` extends `shorter` by whole words, is at least as informative,
/// and is mentioned at least as often.
#[must_use]
pub fn shadows(longer: &EntityCluster, shorter: &EntityCluster) -> bool {
    let prefix = format!("{} ", shorter.canonical().to_lowercase());
    longer.canonical().to_lowercase().starts_with(&prefix)
        && informativeness(longer.canonical()).informative_tokens
            >= informativeness(shorter.canonical()).informative_tokens
        && longer.mention_count() >= shorter.mention_count()
}

fn drop_where(
    arena: &mut ClusterArena,
    reason: &str,
    mut condition: impl FnMut(&ClusterArena, &EntityCluster) -> bool,
) -> usize {
    let doomed: Vec<EntityId> = {
        let view: &ClusterArena = arena;
        view.live()
            .filter(|c| condition(view, c))
            .map(EntityCluster::id)
            .collect()
    };
    for id in &doomed {
        log::debug!("[merge] dropping {} ({})", id, reason);
        arena.discard(*id);
    }
    doomed.len()
}

/// Remove every mention that lies strictly inside another mention of the
/// same cluster. Returns the number removed.
pub fn remove_subsumed_spans(arena: &mut ClusterArena) -> usize {
    let mut removed = 0;
    for id in arena.live_ids() {
        let Some(cluster) = arena.get_mut(id) else {
            continue;
        };
        let spans: Vec<(usize, usize)> = cluster.mentions().iter().map(|m| m.span()).collect();
        let before = spans.len();
        cluster.retain_mentions(|m| {
            !spans
                .iter()
                .any(|&(s, e)| s <= m.start && m.end <= e && (s, e) != (m.start, m.end))
        });
        removed += before - cluster.mention_count();
    }
    removed
}

/// Apply the four filters in order. Each filter sees the survivors of the
/// previous one.
pub fn apply_filters(arena: &mut ClusterArena, report: &mut FilterReport) {
    report.stopwords = drop_where(arena, "stopword", |_, c| is_stopword_cluster(c));
    report.generic_titles = drop_where(arena, "generic title", |_, c| is_bare_generic_person(c));
    report.prefix_shadowed = drop_where(arena, "shadowed by longer name", |arena, c| {
        arena.live().any(|other| other.id() != c.id() && shadows(other, c))
    });
    report.subsumed_spans = remove_subsumed_spans(arena);
}

/// Canonical re-rank and cross-type merge until nothing merges, then the
/// filters.
pub fn merge_and_filter(arena: &mut ClusterArena) -> FilterReport {
    let mut report = FilterReport::default();
    loop {
        rerank_canonicals(arena);
        let merged = merge_cross_type(arena);
        report.cross_type_merges += merged;
        if merged == 0 {
            break;
        }
    }
    apply_filters(arena, &mut report);
    report
}
