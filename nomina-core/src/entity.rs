//! Entity types, extractor provenance, input spans and output records.
//!
//! # Data flow
//!
//! ```text
//! CandidateSpan (upstream extractors)
//!     │
//!     ▼
//! Mention ──► EntityCluster (working unit, arena-addressed)
//!                 │
//!                 ▼
//!             Entity + SpanIndexEntry (handed to relation extraction)
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::cluster::EntityId;
use crate::confidence::Confidence;

// ============================================================================
// Entity Type
// ============================================================================

/// Entity type of a span or cluster.
///
/// Serializes as its upper-case label (`"PERSON"`, `"ORG"`, ...). Labels
/// that are not one of the named variants round-trip through `Other`.
///
/// ```rust
/// use nomina_core::EntityType;
///
/// assert_eq!(EntityType::from_label("org"), EntityType::Organization);
/// assert_eq!(EntityType::Person.as_label(), "PERSON");
/// assert_eq!(EntityType::from_label("CREATURE").as_label(), "CREATURE");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum EntityType {
    /// A person or person-like character.
    Person,
    /// An organization (school, ministry, guild).
    Organization,
    /// A noble house or family line.
    House,
    /// A place.
    Place,
    /// A named spell.
    Spell,
    /// A named material or substance.
    Material,
    /// A named magical object or force.
    Magic,
    /// Any other upstream label, upper-cased.
    Other(String),
}

impl EntityType {
    /// Upper-case label.
    #[must_use]
    pub fn as_label(&self) -> &str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::Organization => "ORG",
            EntityType::House => "HOUSE",
            EntityType::Place => "PLACE",
            EntityType::Spell => "SPELL",
            EntityType::Material => "MATERIAL",
            EntityType::Magic => "MAGIC",
            EntityType::Other(label) => label.as_str(),
        }
    }

    /// Parse from a label. Case-insensitive; accepts common synonyms.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "PERSON" | "PER" | "CHARACTER" => EntityType::Person,
            "ORG" | "ORGANIZATION" | "ORGANISATION" => EntityType::Organization,
            "HOUSE" | "FAMILY" => EntityType::House,
            "PLACE" | "LOC" | "LOCATION" | "GPE" => EntityType::Place,
            "SPELL" => EntityType::Spell,
            "MATERIAL" => EntityType::Material,
            "MAGIC" => EntityType::Magic,
            other => EntityType::Other(other.to_string()),
        }
    }

    /// Priority used when clusters of different types share a canonical name.
    ///
    /// PERSON > ORG > HOUSE > PLACE > everything else.
    #[must_use]
    pub const fn merge_priority(&self) -> u8 {
        match self {
            EntityType::Person => 4,
            EntityType::Organization => 3,
            EntityType::House => 2,
            EntityType::Place => 1,
            _ => 0,
        }
    }

    /// Types whose single lower-case names are usually ordinary words
    /// ("fire", "silver", "light").
    #[must_use]
    pub const fn is_lexical_kind(&self) -> bool {
        matches!(
            self,
            EntityType::Spell | EntityType::Material | EntityType::Magic
        )
    }

    /// Types that receive the small fallback-only boost for collective names.
    #[must_use]
    pub const fn is_collective(&self) -> bool {
        matches!(
            self,
            EntityType::Organization | EntityType::House | EntityType::Place
        )
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl std::str::FromStr for EntityType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl Serialize for EntityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_label())
    }
}

impl<'de> Deserialize<'de> for EntityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

// ============================================================================
// Provenance
// ============================================================================

/// Which upstream extraction strategy produced a span.
///
/// A closed set with an explicit trust order (`Ord`): `Fallback` is the
/// least trusted, `Whitelist` the most.
///
/// ```rust
/// use nomina_core::Provenance;
///
/// assert!(Provenance::Whitelist > Provenance::Ner);
/// assert!(Provenance::Ner > Provenance::Dep);
/// assert!(Provenance::Pattern > Provenance::Fallback);
/// assert!(Provenance::Pattern.is_ner_equivalent());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provenance {
    /// Bare capitalization heuristic (lowest trust).
    Fallback,
    /// Lexical pattern / gazetteer.
    Pattern,
    /// Syntactic dependency pattern.
    Dep,
    /// Model-backed named-entity recognizer.
    Ner,
    /// Curated whitelist (highest trust).
    Whitelist,
}

impl Provenance {
    /// All tags, least trusted first.
    pub const ALL: [Provenance; 5] = [
        Provenance::Fallback,
        Provenance::Pattern,
        Provenance::Dep,
        Provenance::Ner,
        Provenance::Whitelist,
    ];

    /// Upper-case label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Provenance::Whitelist => "WHITELIST",
            Provenance::Ner => "NER",
            Provenance::Dep => "DEP",
            Provenance::Pattern => "PATTERN",
            Provenance::Fallback => "FALLBACK",
        }
    }

    /// Pattern spans are scored and tiered as if an NER model produced them.
    #[must_use]
    pub const fn is_ner_equivalent(&self) -> bool {
        matches!(self, Provenance::Ner | Provenance::Pattern)
    }

    /// Position in the conventional ingestion order: dependency-pattern
    /// spans, then NER, then gazetteer/pattern, then fallback.
    #[must_use]
    pub const fn ingestion_rank(&self) -> u8 {
        match self {
            Provenance::Dep => 0,
            Provenance::Ner => 1,
            Provenance::Whitelist | Provenance::Pattern => 2,
            Provenance::Fallback => 3,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provenance {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WHITELIST" => Ok(Provenance::Whitelist),
            "NER" => Ok(Provenance::Ner),
            "DEP" => Ok(Provenance::Dep),
            "PATTERN" => Ok(Provenance::Pattern),
            "FALLBACK" => Ok(Provenance::Fallback),
            other => Err(crate::Error::parse(format!("unknown provenance: {other}"))),
        }
    }
}

// ============================================================================
// Candidate Span (input)
// ============================================================================

/// A tagged name span produced upstream, positioned against the document
/// text in character offsets `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSpan {
    /// Surface text as it appears in the document.
    pub text: String,
    /// Entity type assigned by the extractor.
    pub entity_type: EntityType,
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// Which extractor produced the span.
    pub provenance: Provenance,
}

impl CandidateSpan {
    /// Create a new span.
    pub fn new(
        text: impl Into<String>,
        entity_type: EntityType,
        start: usize,
        end: usize,
        provenance: Provenance,
    ) -> Self {
        Self {
            text: text.into(),
            entity_type,
            start,
            end,
            provenance,
        }
    }

    /// `0 <= start < end <= text_len`.
    #[must_use]
    pub fn is_within(&self, text_len: usize) -> bool {
        self.start < self.end && self.end <= text_len
    }
}

// ============================================================================
// Tier
// ============================================================================

/// Discrete entity quality bucket.
///
/// Ordered `A < B < C`: a *lower* tier value is a *better* entity, so
/// "at or above tier B" means `tier <= Tier::B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Core, graph-worthy.
    #[serde(rename = "TIER_A")]
    A,
    /// Supporting.
    #[serde(rename = "TIER_B")]
    B,
    /// Provisional / isolated. Never merged with anything.
    #[serde(rename = "TIER_C")]
    C,
}

impl Tier {
    /// Label as emitted in outputs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tier::A => "TIER_A",
            Tier::B => "TIER_B",
            Tier::C => "TIER_C",
        }
    }

    /// True if `self` is at least as good as `min`.
    #[must_use]
    pub fn meets(&self, min: Tier) -> bool {
        *self <= min
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Output records
// ============================================================================

/// A resolved entity, emitted once the span stream is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier within one resolution run.
    pub id: EntityId,
    /// Entity type (after cross-type reconciliation).
    pub entity_type: EntityType,
    /// Best display name.
    pub canonical: String,
    /// Alternate names, in the order they were first seen.
    pub aliases: Vec<String>,
    /// Final entity confidence.
    pub confidence: Confidence,
    /// Quality tier.
    pub tier: Tier,
    /// Machine-readable reason for the tier.
    pub tier_reason: String,
    /// Number of distinct surviving span positions.
    pub mention_count: usize,
    /// Extractors that contributed, least trusted first.
    pub sources: Vec<Provenance>,
}

/// Binds one surviving span to its entity, for relation extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpanIndexEntry {
    /// Start character offset.
    pub start: usize,
    /// End character offset.
    pub end: usize,
    /// Owning entity.
    pub entity_id: EntityId,
}
