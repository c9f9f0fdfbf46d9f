//! Entity clusters and the arena that owns them.
//!
//! Clusters are addressed by stable [`EntityId`]s. Merging never moves a
//! cluster: the secondary is emptied in place and marked retired, and every
//! migrated mention has its `owner` re-pointed to the primary. Retired
//! clusters stay in the arena so ids never dangle, but [`ClusterArena::live`]
//! skips them.
//!
//! Invariants maintained by [`EntityCluster`]:
//! - the canonical name never appears in the alias set (case-insensitive);
//! - aliases are deduplicated case-insensitively;
//! - `mention_count()` is the number of distinct `(start, end)` positions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::confidence::Confidence;
use crate::entity::{EntityType, Provenance, Tier};
use crate::error::{Error, Result};
use crate::mention::{Mention, MentionId, MentionType};

/// Identifier of an entity cluster, stable for one resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// ============================================================================
// Entity Cluster
// ============================================================================

/// The working representation of one entity during resolution.
#[derive(Debug, Clone)]
pub struct EntityCluster {
    id: EntityId,
    entity_type: EntityType,
    canonical: String,
    mentions: Vec<Mention>,
    aliases: Vec<String>,
    sources: BTreeSet<Provenance>,
    confidence: Confidence,
    first_position: usize,
    tier: Option<(Tier, String)>,
    retired: bool,
}

impl EntityCluster {
    /// Create a cluster seeded with one mention.
    ///
    /// The mention is re-pointed at `id`.
    pub fn new(
        id: EntityId,
        entity_type: EntityType,
        canonical: impl Into<String>,
        mut first_mention: Mention,
        sources: impl IntoIterator<Item = Provenance>,
        confidence: f64,
    ) -> Self {
        first_mention.owner = id;
        let first_position = first_mention.start;
        Self {
            id,
            entity_type,
            canonical: canonical.into(),
            mentions: vec![first_mention],
            aliases: Vec::new(),
            sources: sources.into_iter().collect(),
            confidence: Confidence::saturating(confidence),
            first_position,
            tier: None,
            retired: false,
        }
    }

    /// Cluster identifier.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Entity type.
    #[must_use]
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Current canonical name.
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Aliases in first-seen order.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Mentions in insertion order, one per distinct position.
    #[must_use]
    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }

    /// Number of distinct span positions.
    #[must_use]
    pub fn mention_count(&self) -> usize {
        self.mentions.len()
    }

    /// Provenance tags observed, least trusted first.
    #[must_use]
    pub fn sources(&self) -> &BTreeSet<Provenance> {
        &self.sources
    }

    /// Working confidence (seed confidence, averaged through merges), or
    /// the final entity confidence once [`EntityCluster::finalize`] ran.
    #[must_use]
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Smallest start offset ever recorded for this cluster.
    #[must_use]
    pub fn first_position(&self) -> usize {
        self.first_position
    }

    /// Tier, once assigned.
    #[must_use]
    pub fn tier(&self) -> Option<Tier> {
        self.tier.as_ref().map(|(tier, _)| *tier)
    }

    /// Tier reason, once assigned.
    #[must_use]
    pub fn tier_reason(&self) -> Option<&str> {
        self.tier.as_ref().map(|(_, reason)| reason.as_str())
    }

    /// True once the cluster was merged away or lost all its mentions.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired || self.mentions.is_empty()
    }

    /// True if a mention already occupies `(start, end)`.
    #[must_use]
    pub fn has_position(&self, start: usize, end: usize) -> bool {
        self.mentions.iter().any(|m| m.start == start && m.end == end)
    }

    /// Add a mention.
    ///
    /// Returns `false` (and drops the mention) when its position is already
    /// recorded. A canonical-type mention whose surface is longer than the
    /// current canonical is promoted to canonical.
    pub fn add_mention(&mut self, mut mention: Mention) -> bool {
        if self.has_position(mention.start, mention.end) {
            return false;
        }
        mention.owner = self.id;
        self.first_position = self.first_position.min(mention.start);
        let surface = name_form(&mention.surface);
        let promote = mention.mention_type == MentionType::Canonical
            && surface.chars().count() > self.canonical.chars().count();
        self.mentions.push(mention);
        if promote {
            self.set_canonical(surface);
        }
        true
    }

    /// Replace the canonical name, demoting the old one into the aliases.
    ///
    /// Returns `false` if `name` is empty or already the canonical.
    pub fn set_canonical(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.trim().is_empty() || name.eq_ignore_ascii_case(&self.canonical) {
            return false;
        }
        let old = std::mem::replace(&mut self.canonical, name);
        self.aliases.retain(|a| !a.eq_ignore_ascii_case(&self.canonical));
        self.push_alias(old);
        true
    }

    /// Record an alias. Rejects empty strings, the canonical itself, and
    /// case-insensitive duplicates.
    pub fn add_alias(&mut self, alias: impl Into<String>) -> bool {
        let alias = alias.into();
        if alias.trim().is_empty() || alias.eq_ignore_ascii_case(&self.canonical) {
            return false;
        }
        self.push_alias(alias)
    }

    fn push_alias(&mut self, alias: String) -> bool {
        if self.aliases.iter().any(|a| a.eq_ignore_ascii_case(&alias)) {
            return false;
        }
        self.aliases.push(alias);
        true
    }

    /// Record an extractor tag.
    pub fn add_source(&mut self, provenance: Provenance) {
        self.sources.insert(provenance);
    }

    /// Remove and return the mention at `(start, end)`.
    pub fn take_mention(&mut self, start: usize, end: usize) -> Option<Mention> {
        let idx = self
            .mentions
            .iter()
            .position(|m| m.start == start && m.end == end)?;
        Some(self.mentions.remove(idx))
    }

    /// Keep only the mentions for which `keep` returns true.
    pub fn retain_mentions(&mut self, keep: impl FnMut(&Mention) -> bool) {
        self.mentions.retain(keep);
    }

    /// Replace the working confidence.
    pub fn set_confidence(&mut self, confidence: Confidence) {
        self.confidence = confidence;
    }

    /// Store the final confidence and tier.
    pub fn finalize(&mut self, confidence: Confidence, tier: Tier, reason: impl Into<String>) {
        self.confidence = confidence;
        self.tier = Some((tier, reason.into()));
    }

    fn retire(&mut self) {
        self.mentions.clear();
        self.aliases.clear();
        self.retired = true;
    }
}

/// Surface with edge punctuation dropped and inner whitespace collapsed.
fn name_form(surface: &str) -> String {
    surface
        .trim_matches(|c: char| !c.is_alphanumeric())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Cluster Arena
// ============================================================================

/// Owns every cluster of one resolution run.
#[derive(Debug, Clone, Default)]
pub struct ClusterArena {
    clusters: Vec<EntityCluster>,
    next_mention: u32,
}

impl ClusterArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next created cluster will receive.
    #[must_use]
    pub fn next_id(&self) -> EntityId {
        EntityId(self.clusters.len() as u32)
    }

    /// Allocate a fresh mention id.
    pub fn allocate_mention_id(&mut self) -> MentionId {
        let id = MentionId(self.next_mention);
        self.next_mention += 1;
        id
    }

    /// Create a cluster seeded with `first_mention`.
    pub fn create(
        &mut self,
        entity_type: EntityType,
        canonical: impl Into<String>,
        first_mention: Mention,
        sources: impl IntoIterator<Item = Provenance>,
        confidence: f64,
    ) -> EntityId {
        let id = self.next_id();
        self.clusters.push(EntityCluster::new(
            id,
            entity_type,
            canonical,
            first_mention,
            sources,
            confidence,
        ));
        id
    }

    /// Look up a cluster (retired ones included).
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntityCluster> {
        self.clusters.get(id.0 as usize)
    }

    /// Look up a cluster mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityCluster> {
        self.clusters.get_mut(id.0 as usize)
    }

    /// Clusters that have not been retired, in id order.
    pub fn live(&self) -> impl Iterator<Item = &EntityCluster> {
        self.clusters.iter().filter(|c| !c.is_retired())
    }

    /// Ids of live clusters, in id order.
    #[must_use]
    pub fn live_ids(&self) -> Vec<EntityId> {
        self.live().map(EntityCluster::id).collect()
    }

    /// Number of clusters ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True if no cluster was ever created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Merge `secondary` into `primary`.
    ///
    /// Unions mentions (duplicate positions collapse), aliases (the
    /// secondary's canonical included) and provenance; sets the primary's
    /// confidence to the mention-count-weighted mean of both; keeps the
    /// smaller first position; re-points migrated mentions. The secondary is
    /// left empty and retired.
    ///
    /// Returns `false` and does nothing when the ids are equal or unknown.
    pub fn merge(&mut self, primary: EntityId, secondary: EntityId) -> bool {
        if primary == secondary
            || self.get(primary).is_none()
            || self.get(secondary).is_none()
        {
            log::debug!("[arena] ignoring merge {} <- {}", primary, secondary);
            return false;
        }

        let (canonical, mentions, aliases, sources, confidence, first_position) = {
            let Some(sec) = self.get_mut(secondary) else {
                return false;
            };
            let taken = (
                sec.canonical.clone(),
                std::mem::take(&mut sec.mentions),
                std::mem::take(&mut sec.aliases),
                sec.sources.clone(),
                sec.confidence,
                sec.first_position,
            );
            sec.retire();
            taken
        };

        let Some(pri) = self.get_mut(primary) else {
            return false;
        };
        pri.confidence =
            pri.confidence
                .weighted_mean(pri.mention_count(), confidence, mentions.len());
        for mention in mentions {
            pri.add_mention(Mention {
                mention_type: if mention.mention_type == MentionType::Canonical {
                    MentionType::ShortForm
                } else {
                    mention.mention_type
                },
                ..mention
            });
        }
        pri.add_alias(canonical);
        for alias in aliases {
            pri.add_alias(alias);
        }
        pri.sources.extend(sources);
        pri.first_position = pri.first_position.min(first_position);
        true
    }

    /// Retire a cluster without merging it anywhere. Returns `false` if the
    /// id is unknown or already retired.
    pub fn discard(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(cluster) if !cluster.is_retired() => {
                cluster.retire();
                true
            }
            _ => false,
        }
    }

    /// Like [`ClusterArena::merge`], but reports misuse as an error.
    pub fn try_merge(&mut self, primary: EntityId, secondary: EntityId) -> Result<()> {
        if primary == secondary {
            return Err(Error::invalid_input(format!(
                "cannot merge cluster {primary} into itself"
            )));
        }
        for id in [primary, secondary] {
            if self.get(id).is_none() {
                return Err(Error::invalid_input(format!("unknown cluster {id}")));
            }
        }
        self.merge(primary, secondary);
        Ok(())
    }

    /// Move the mention at `(start, end)` from one cluster to another.
    ///
    /// The destination also records the source's provenance for that
    /// mention. A source left without mentions is retired and its names are
    /// folded into the destination.
    pub fn transfer_mention(
        &mut self,
        from: EntityId,
        to: EntityId,
        start: usize,
        end: usize,
    ) -> bool {
        if from == to || self.get(to).is_none() {
            return false;
        }
        let Some(mention) = self
            .get_mut(from)
            .and_then(|c| c.take_mention(start, end))
        else {
            return false;
        };
        let provenance = mention.provenance;
        let emptied = self.get(from).is_some_and(|c| c.mentions.is_empty());
        if let Some(dest) = self.get_mut(to) {
            dest.add_source(provenance);
            dest.add_mention(Mention {
                mention_type: MentionType::ShortForm,
                ..mention
            });
        }
        if emptied {
            self.merge(to, from);
        }
        true
    }
}
