//! Witness type for confidence values bounded to [0.0, 1.0].
//!
//! # What an entity confidence means here
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                 ENTITY CONFIDENCE IS A HEURISTIC BLEND               │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  base (most trusted extractor)                                       │
//! │    × mention bonus (repeated evidence, capped)                       │
//! │    × generic-word penalty ("King", "Professor")                      │
//! │    × context bonus ("named X", "son of X", "X's")                    │
//! │    × fallback-only boost (capitalization-only multiword names)       │
//! │                                                                      │
//! │  then clamped into [0, 1].                                           │
//! │                                                                      │
//! │  It ranks entities within one document. It is not a probability     │
//! │  and is not comparable across differently configured runs.          │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The diagnostic bands used for quality monitoring:
//!
//! | Band     | Range         |
//! |----------|---------------|
//! | High     | `>= 0.8`      |
//! | Medium   | `[0.6, 0.8)`  |
//! | Low      | `[0.5, 0.6)`  |
//! | Filtered | `< 0.5`       |

use serde::{Deserialize, Serialize};
use std::fmt;

/// A confidence score guaranteed to be in [0.0, 1.0].
///
/// This is a "witness type": once you hold a `Confidence`, the bounds
/// have been checked.
///
/// # Example
///
/// ```rust
/// use nomina_core::Confidence;
///
/// assert!(Confidence::new(0.5).is_some());
/// assert!(Confidence::new(1.5).is_none());
///
/// let conf = Confidence::saturating(1.0925);
/// assert_eq!(conf.get(), 1.0);
/// ```
#[derive(Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    /// The minimum valid confidence value.
    pub const MIN: Self = Self(0.0);

    /// The maximum valid confidence value.
    pub const MAX: Self = Self(1.0);

    /// Create a confidence score, returning `None` if out of range.
    #[must_use]
    #[inline]
    pub fn new(value: f64) -> Option<Self> {
        if (0.0..=1.0).contains(&value) && !value.is_nan() {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a confidence score, clamping to [0.0, 1.0]. NaN becomes 0.0.
    #[must_use]
    #[inline]
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Get the inner value.
    #[must_use]
    #[inline]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Which diagnostic band this score falls in.
    #[must_use]
    pub fn band(self) -> ConfidenceBand {
        ConfidenceBand::of(self.0)
    }

    /// Mention-count-weighted average of two scores.
    ///
    /// Falls back to `self` when both weights are zero.
    #[must_use]
    pub fn weighted_mean(self, self_weight: usize, other: Self, other_weight: usize) -> Self {
        let total = self_weight + other_weight;
        if total == 0 {
            return self;
        }
        let sum = self.0 * self_weight as f64 + other.0 * other_weight as f64;
        Self::saturating(sum / total as f64)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Debug for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Confidence({:.4})", self.0)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Diagnostic confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    /// `>= 0.8`
    High,
    /// `[0.6, 0.8)`
    Medium,
    /// `[0.5, 0.6)`
    Low,
    /// `< 0.5`
    Filtered,
}

impl ConfidenceBand {
    /// Classify a raw score.
    #[must_use]
    pub fn of(value: f64) -> Self {
        if value >= 0.8 {
            Self::High
        } else if value >= 0.6 {
            Self::Medium
        } else if value >= 0.5 {
            Self::Low
        } else {
            Self::Filtered
        }
    }
}
