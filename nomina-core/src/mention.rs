//! Mention records: one accepted occurrence of a reference to an entity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cluster::EntityId;
use crate::confidence::Confidence;
use crate::entity::Provenance;

/// Identifier of a mention, unique within one resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentionId(pub u32);

impl fmt::Display for MentionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// How a mention refers to its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionType {
    /// The full/best name ("Harry Potter").
    Canonical,
    /// A shorter form of the name ("Harry", "Potter").
    ShortForm,
    /// A pronoun ("he", "she"). Never a canonical name or alias.
    Pronoun,
    /// A descriptive reference ("the old wizard", "Gandalf the Grey").
    Descriptor,
    /// A possessive form ("Harry's").
    Possessive,
}

impl MentionType {
    /// Snake-case label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MentionType::Canonical => "canonical",
            MentionType::ShortForm => "short_form",
            MentionType::Pronoun => "pronoun",
            MentionType::Descriptor => "descriptor",
            MentionType::Possessive => "possessive",
        }
    }
}

impl fmt::Display for MentionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occurrence of a reference to an entity.
///
/// Immutable after creation, except that merges re-point `owner`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Mention identifier.
    pub id: MentionId,
    /// Owning entity cluster.
    pub owner: EntityId,
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// Surface text as extracted.
    pub surface: String,
    /// Index of the sentence containing `start`.
    pub sentence_idx: usize,
    /// Whether the mention opens its sentence.
    pub sentence_initial: bool,
    /// How the mention refers to its entity.
    pub mention_type: MentionType,
    /// Extractor that produced the span.
    pub provenance: Provenance,
    /// Per-mention confidence (diagnostic).
    pub confidence: Confidence,
}

impl Mention {
    /// Create a mention record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: MentionId,
        owner: EntityId,
        span: (usize, usize),
        surface: impl Into<String>,
        sentence_idx: usize,
        mention_type: MentionType,
        provenance: Provenance,
        confidence: f64,
    ) -> Self {
        Self {
            id,
            owner,
            start: span.0,
            end: span.1,
            surface: surface.into(),
            sentence_idx,
            sentence_initial: false,
            mention_type,
            provenance,
            confidence: Confidence::saturating(confidence),
        }
    }

    /// Mark whether the mention opens its sentence.
    #[must_use]
    pub fn with_sentence_initial(mut self, sentence_initial: bool) -> Self {
        self.sentence_initial = sentence_initial;
        self
    }

    /// `(start, end)` position.
    #[must_use]
    pub const fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// True if `self` lies inside `other` without being identical to it.
    #[must_use]
    pub fn is_strictly_within(&self, other: &Mention) -> bool {
        other.start <= self.start
            && self.end <= other.end
            && (self.start, self.end) != (other.start, other.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(start: usize, end: usize) -> Mention {
        Mention::new(
            MentionId(0),
            EntityId(0),
            (start, end),
            "x",
            0,
            MentionType::Canonical,
            Provenance::Ner,
            0.9,
        )
    }

    #[test]
    fn strict_containment() {
        let outer = mention(10, 26);
        assert!(mention(10, 17).is_strictly_within(&outer));
        assert!(mention(12, 26).is_strictly_within(&outer));
        assert!(!mention(10, 26).is_strictly_within(&outer));
        assert!(!mention(5, 12).is_strictly_within(&outer));
    }

    #[test]
    fn confidence_is_clamped() {
        let m = Mention::new(
            MentionId(1),
            EntityId(0),
            (0, 1),
            "x",
            0,
            MentionType::Pronoun,
            Provenance::Fallback,
            1.7,
        );
        assert_eq!(m.confidence.get(), 1.0);
    }

    #[test]
    fn labels() {
        assert_eq!(MentionType::ShortForm.to_string(), "short_form");
        assert_eq!(MentionId(7).to_string(), "m7");
    }
}
